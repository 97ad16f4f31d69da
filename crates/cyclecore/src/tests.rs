use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn rom_only_uses_defaults() {
    let options = Options::parse(args(&["game.bin"])).unwrap();
    assert_eq!(options.rom, Some(PathBuf::from("game.bin")));
    assert_eq!(options.msec, 1000);
    assert!(options.save.is_none());
    assert!(!options.list_devices);
}

#[test]
fn all_flags() {
    let options = Options::parse(args(&[
        "--msec", "250", "game.bin", "--save", "out.state", "--load", "in.state",
    ]))
    .unwrap();
    assert_eq!(options.msec, 250);
    assert_eq!(options.save, Some(PathBuf::from("out.state")));
    assert_eq!(options.load, Some(PathBuf::from("in.state")));
}

#[test]
fn listing_devices_needs_no_rom() {
    let options = Options::parse(args(&["--list-devices"])).unwrap();
    assert!(options.list_devices);
    assert!(options.rom.is_none());
}

#[test]
fn bad_arguments() {
    assert!(Options::parse(args(&[])).is_err());
    assert!(Options::parse(args(&["game.bin", "--msec"])).is_err());
    assert!(Options::parse(args(&["game.bin", "--msec", "ten"])).is_err());
    assert!(Options::parse(args(&["game.bin", "--fast"])).is_err());
    assert!(Options::parse(args(&["a.bin", "b.bin"])).is_err());
}

#[test]
fn report_shows_registers() {
    let mut board = Board::new(BoardConfig::default()).unwrap();
    board.load_rom(&[]).unwrap();
    let text = report(&board);
    assert!(text.contains("PC=2080"));
    assert!(text.contains("PSW=....... ........"));
    assert!(!text.contains("serial"));
}
