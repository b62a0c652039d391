//! Merging a real annotated game: Rubinstein - Duras, Vienna 1908, with the
//! annotation payload exactly as the game page serves it.
use pgn_core::{
    annotate, move_tokens, tokenize, IndexConvention, IndexMode, MoveNumberStyle, RawGamePayload,
};

const RUBINSTEIN_DURAS: &str = r#"[Event "Vienna"]
[Site "Vienna AUH"]
[Date "1908.04.04"]
[EventDate "1908.03.23"]
[Round "10"]
[Result "1-0"]
[White "Akiba Rubinstein"]
[Black "Oldrich Duras"]
[ECO "D02"]
[WhiteElo "?"]
[BlackElo "?"]
[PlyCount "77"]

1.d4 d5 2.Nf3 c5 3.e3 Nf6 4.dxc5 Qa5+ 5.Nbd2 Qxc5 6.a3 Qc7 7.c4 dxc4 8.Nxc4 Nc6 9.b4 Bg4 10.Bb2 b5 11.Nce5 Nxe5 12.Nxe5 Bxd1 13.Bxb5+ Nd7 14.Bxd7+ Qxd7 15.Nxd7 Bh5 16.Ne5 Rc8 17.g4 Bg6 18.Nxg6 hxg6 19.Bd4 a6 20.Kd2 f6 21.Rac1 Rxc1 22.Rxc1 e5 23.Bc5 Rxh2 24.Bxf8 Kxf8 25.Ke2 e4 26.Rc6 Rg2 27.Rxa6 Rxg4 28.Ra7 Rg1 29.b5 Rb1 30.a4 g5 31.Rb7 Ra1 32.b6 Rxa4 33.Ra7 Rb4 34.b7 g4 35.Ra8+ Kf7 36.b8=Q Rxb8 37.Rxb8 Ke6 38.Re8+ Kf5 39.Kf1 1-0"#;

const NOTES: &str = r#"[0,&quot;Notes by Carl Schlechter from \&quot;Deutsche Schachzeitung\&quot; 1908.&quot;,7,&quot;? Bad, because this helps the opponent to develop. The right move is 4...e6, and if 5.b4? then 5...a5 6.c3 axb4 7.cxb4 b6 regaining the pawn.&quot;,13,&quot;This also helps White’s development. Better was 7...e6.&quot;,19,&quot;? This will be refuted by a nice combination by White, but Black already stands worse. If, for example, 10...e6, then 11.Rc1!, threatening b5.&quot;,20,&quot;!&quot;,22,&quot;!!&quot;,25,&quot;Best. If 13...Kd8 14.Rxd1+ Kc8 15.Ba6+ Kb8 16.Nc6+ Qxc6 17.Be5+ Qd6 (17...Qc7 18.Rd8+ mate) 18.Rc1!! and mate next move.&quot;,26,&quot;The simplest. White forces an endgame with a pawn plus. Stronger was 14.Rxd1 Rd8 15.Nxd7 Rxd7 (or 15...e6 16.Ne5+ Ke7 17.Nc6+, etc.) 16.Bxd7+ Kd8 17.Bb5+ Kc8 18.Ba6+ Kb8 19.Rc1!, followed by Be5, and wins.&quot;,43,&quot;Or 22...Rxh2 23.Rc8+ Kf7 24.Ke2! e5 25.Bc5 Bxc5 26.Rxc5 followed by Ra5 winning the a-pawn.&quot;,48,&quot;!&quot;,51,&quot;If 26...a5 27.b5 followed by Ra6.&quot;]"#;

fn payload() -> RawGamePayload {
    RawGamePayload::new(RUBINSTEIN_DURAS, Some(NOTES.to_string()))
}

#[test]
fn test_every_note_lands_on_its_move() {
    let game = annotate(&payload(), IndexMode::Auto).unwrap();

    assert_eq!(game.plies(), 77);
    assert_eq!(game.placed(), 11);
    assert_eq!(game.convention(), IndexConvention::Direct);
    assert_eq!(game.result(), Some("1-0"));

    let pgn = game.to_pgn();
    assert!(pgn.contains(
        "1.d4 {Notes by Carl Schlechter from \"Deutsche Schachzeitung\" 1908.} d5 2.Nf3"
    ));
    assert!(pgn.contains("4.dxc5 Qa5+ {? Bad, because this helps the opponent to develop."));
    assert!(pgn.contains(
        "7.c4 dxc4 {This also helps White’s development. Better was 7...e6.} 8.Nxc4"
    ));
    assert!(pgn.contains("10.Bb2 b5 {? This will be refuted"));
    assert!(pgn.contains("11.Nce5 {!} Nxe5 12.Nxe5 {!!} Bxd1"));
    assert!(pgn.contains("13.Bxb5+ Nd7 {Best. If 13...Kd8"));
    assert!(pgn.contains(
        "(17...Qc7 18.Rd8+ mate) 18.Rc1!! and mate next move.} 14.Bxd7+ {The simplest."
    ));
    assert!(pgn.contains("22.Rxc1 e5 {Or 22...Rxh2"));
    assert!(pgn.contains("25.Ke2 {!} e4"));
    assert!(pgn.contains("26.Rc6 Rg2 {If 26...a5 27.b5 followed by Ra6.} 27.Rxa6"));
    assert!(pgn.ends_with("39.Kf1 1-0"));
}

#[test]
fn test_notes_escaped_twice_still_land() {
    // One more round of HTML escaping only touches the ampersands here
    let escaped = NOTES.replace('&', "&amp;");
    let game = annotate(&RawGamePayload::new(RUBINSTEIN_DURAS, Some(escaped)), IndexMode::Auto)
        .unwrap();

    assert_eq!(game.placed(), 11);
    assert_eq!(game.convention(), IndexConvention::Direct);
    let pgn = game.to_pgn();
    assert!(pgn.contains(
        "1.d4 {Notes by Carl Schlechter from \"Deutsche Schachzeitung\" 1908.} d5 2.Nf3"
    ));
    assert!(pgn.contains("26.Rc6 Rg2 {If 26...a5 27.b5 followed by Ra6.} 27.Rxa6"));
}

#[test]
fn test_header_passes_through_unchanged() {
    let game = annotate(&payload(), IndexMode::Auto).unwrap();
    let header_end = RUBINSTEIN_DURAS.find("1.d4").unwrap();
    assert_eq!(game.header(), &RUBINSTEIN_DURAS[..header_end]);
}

#[test]
fn test_merged_game_keeps_every_move() {
    let game = annotate(&payload(), IndexMode::Auto).unwrap();

    let before: Vec<String> = move_tokens(RUBINSTEIN_DURAS.split("\n\n").nth(1).unwrap())
        .map(|t| t.text)
        .collect();
    let merged = tokenize(game.movetext()).unwrap();
    let after: Vec<String> = merged.tokens.into_iter().map(|t| t.text).collect();

    assert_eq!(before.len(), 77);
    assert_eq!(before, after);
    assert_eq!(merged.style, MoveNumberStyle::Glued);
}

#[test]
fn test_without_notes_the_game_is_untouched() {
    let game = annotate(&RawGamePayload::new(RUBINSTEIN_DURAS, None), IndexMode::Auto).unwrap();
    assert_eq!(game.to_pgn(), RUBINSTEIN_DURAS);
    assert_eq!(game.placed(), 0);
}

#[test]
fn test_offset_convention_shifts_every_note() {
    let game = annotate(
        &payload(),
        IndexMode::Fixed(IndexConvention::OffsetByTwo),
    )
    .unwrap();

    let pgn = game.to_pgn();
    // Index 7 belongs to ply 5 under the offset convention
    assert!(pgn.contains("3.e3 Nf6 {? Bad, because"));
    assert!(pgn.starts_with("[Event \"Vienna\"]"));
    assert_eq!(game.convention(), IndexConvention::OffsetByTwo);
}
