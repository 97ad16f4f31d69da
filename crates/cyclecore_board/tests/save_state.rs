use cyclecore_board::{Board, BoardConfig};
use cyclecore_common::{Attotime, EmuError, Machine};

/// Frame interrupts counted in register 0x34, with a UART byte sent from
/// every handler.
fn rom() -> Vec<u8> {
    let mut image = vec![0xff; 0x200];
    image[0x0e..0x10].copy_from_slice(&0x2100u16.to_le_bytes());
    let main = [
        0xa1, 0x00, 0x1e, 0x18, // LD SP, #0x1e00
        0xb1, 0x80, 0x08, // LDB INT_MASK, #0x80
        0xb1, 0x50, 0x30, // LDB 0x30, #0x50
        0xc7, 0x01, 0x01, 0x90, 0x30, // STB 0x30, LIR
        0xb1, 0x04, 0x30, // LDB 0x30, #0x04
        0xc7, 0x01, 0x17, 0xa0, 0x30, // STB 0x30, UART command
        0xfb, // EI
        0x27, 0xfe, // SJMP $
    ];
    let isr = [
        0xb3, 0x01, 0x05, 0x1f, 0x32, // LDB 0x32, IACK level 5
        0x17, 0x34, // INCB 0x34
        0xb1, b'*', 0x36, // LDB 0x36, #'*'
        0xc7, 0x01, 0x19, 0xa0, 0x36, // STB 0x36, UART THR
        0xf0, // RET
    ];
    image[0x80..0x80 + main.len()].copy_from_slice(&main);
    image[0x100..0x100 + isr.len()].copy_from_slice(&isr);
    image
}

fn board() -> Board {
    let mut board = Board::new(BoardConfig::default()).unwrap();
    board.load_rom(&rom()).unwrap();
    board
}

#[test]
fn restore_then_run_matches_uninterrupted_run() {
    let mut reference = board();
    reference.run_for(Attotime::from_msec(45)).unwrap();
    let snapshot = reference.save_state();
    reference.run_for(Attotime::from_msec(70)).unwrap();
    let expected = reference.save_state();

    let mut restored = board();
    restored.load_state(&snapshot).unwrap();
    assert_eq!(restored.now(), Attotime::from_msec(45));
    restored.run_for(Attotime::from_msec(70)).unwrap();

    assert_eq!(restored.now(), reference.now());
    assert_eq!(restored.cpu().total_cycles(), reference.cpu().total_cycles());
    assert_eq!(restored.frame_counter(), 6);
    assert_eq!(restored.cpu().register_file()[0x34], 6);
    assert!(restored.save_state() == expected);
}

#[test]
fn handlers_send_serial_bytes() {
    let mut board = board();
    board.run_for(Attotime::from_msec(120)).unwrap();
    assert_eq!(board.frame_counter(), 7);
    assert_eq!(board.serial_output(), b"*******");
}

#[test]
fn truncated_state_is_rejected() {
    let mut board = board();
    board.run_for(Attotime::from_msec(5)).unwrap();
    let blob = board.save_state();
    let err = board.load_state(&blob[..blob.len() - 1]).unwrap_err();
    assert!(matches!(err, EmuError::StateCorrupt(_)));
}

#[test]
fn state_from_another_layout_is_rejected() {
    let mut board = board();
    board.run_for(Attotime::from_msec(20)).unwrap();
    let blob = board.save_state();

    let mut scheduler = cyclecore_common::Scheduler::new();
    scheduler.timer_alloc("only");
    let other = cyclecore_common::state::StateWriter::save(&mut scheduler);
    let err = board.load_state(&other).unwrap_err();
    assert!(matches!(err, EmuError::StateMismatch { .. }), "{err:?}");

    // Nothing was written before the mismatch was found.
    assert_eq!(board.now(), Attotime::from_msec(20));
    assert_eq!(board.frame_counter(), 1);
    assert!(board.save_state() == blob);

    board.load_state(&blob).unwrap();
    assert!(board.save_state() == blob);
}
