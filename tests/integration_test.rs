// Integration tests for the Game Boy CPU

use std::thread;
use std::time::Duration;

use rust_gb_cpu::{Cpu, CpuError, CpuState, Emulator, Fault, Flags, RegisterId};

/// Create a ROM with a test program
fn create_test_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];

    // Copy program to entry point
    for (i, byte) in program.iter().enumerate() {
        rom[0x0100 + i] = *byte;
    }

    rom
}

/// Run until HALT (or panic after max_cycles)
fn run_to_halt(program: &[u8], max_cycles: u64) -> Cpu {
    let rom = create_test_rom(program);
    let mut cpu = Cpu::new(&rom).unwrap();
    cpu.run(max_cycles).unwrap();
    assert_eq!(cpu.state(), CpuState::Halted, "program did not halt");
    cpu
}

#[test]
fn test_serial_hello_world() {
    // Program that outputs "Hello" via serial
    let program: &[u8] = &[
        // Output "Hello" via serial (0xFF01 = SB, 0xFF02 = SC)
        0x3E, b'H',       // LD A, 'H'
        0xE0, 0x01,       // LDH (0x01), A  -> SB
        0x3E, 0x81,       // LD A, 0x81
        0xE0, 0x02,       // LDH (0x02), A  -> SC (trigger transfer)

        0x3E, b'e',       // LD A, 'e'
        0xE0, 0x01,
        0x3E, 0x81,
        0xE0, 0x02,

        0x3E, b'l',       // LD A, 'l'
        0xE0, 0x01,
        0x3E, 0x81,
        0xE0, 0x02,

        0x3E, b'l',       // LD A, 'l'
        0xE0, 0x01,
        0x3E, 0x81,
        0xE0, 0x02,

        0x3E, b'o',       // LD A, 'o'
        0xE0, 0x01,
        0x3E, 0x81,
        0xE0, 0x02,

        0x76,             // HALT
    ];

    let rom = create_test_rom(program);
    let mut emu = Emulator::with_rom(&rom).unwrap();

    assert!(emu.run_until_halt(100_000).unwrap());

    assert_eq!(emu.serial_output(), "Hello");
    assert_eq!(emu.cpu.state(), CpuState::Halted);
}

#[test]
fn test_nop() {
    let rom = create_test_rom(&[0x00]);
    let mut cpu = Cpu::new(&rom).unwrap();
    let af = cpu.register(RegisterId::AF);

    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.register(RegisterId::PC), 0x0101);
    assert_eq!(cpu.register(RegisterId::AF), af);
}

#[test]
fn test_ld_b_n() {
    let rom = create_test_rom(&[0x06, 0x42]); // LD B, 0x42
    let mut cpu = Cpu::new(&rom).unwrap();

    assert_eq!(cpu.step().unwrap(), 8);
    assert_eq!(cpu.register(RegisterId::B), 0x42);
    assert_eq!(cpu.register(RegisterId::PC), 0x0102);
}

#[test]
fn test_add_instruction() {
    // Test ADD A, B instruction
    // A = 0x10, B = 0x20, result should be 0x30
    let program: &[u8] = &[
        0x3E, 0x10,       // LD A, 0x10
        0x06, 0x20,       // LD B, 0x20
        0x80,             // ADD A, B
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::A), 0x30);
    assert_eq!(cpu.flags(), Flags::empty()); // No zero, no carries, addition
}

#[test]
fn test_add_overflow_flags() {
    let program: &[u8] = &[
        0x3E, 0xFF,       // LD A, 0xFF
        0x06, 0x01,       // LD B, 0x01
        0x80,             // ADD A, B
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::A), 0x00);
    assert!(cpu.flags().contains(Flags::Z));
    assert!(!cpu.flags().contains(Flags::N));
    assert!(cpu.flags().contains(Flags::H));
    assert!(cpu.flags().contains(Flags::C));
}

#[test]
fn test_loop_counter() {
    // Count B down from 5
    let program: &[u8] = &[
        0x06, 0x05,       // LD B, 5
        0x05,             // loop: DEC B
        0x20, 0xFD,       // JR NZ, loop
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::B), 0);
    assert!(cpu.flags().contains(Flags::Z));
    // LD 8 + 5 * DEC 4 + 4 taken JR 12 + 1 JR 8 + HALT 4
    assert_eq!(cpu.clock().total_cycles(), 88);
}

#[test]
fn test_call_ret_stack_balance() {
    let mut program = vec![
        0x31, 0xFE, 0xFF, // LD SP, 0xFFFE
        0xCD, 0x10, 0x01, // CALL 0x0110
        0x76,             // HALT
    ];
    program.resize(0x10, 0x00);
    program.extend_from_slice(&[
        0x3E, 0x42,       // 0x0110: LD A, 0x42
        0xC9,             // RET
    ]);

    let rom = create_test_rom(&program);
    let mut cpu = Cpu::new(&rom).unwrap();

    cpu.step().unwrap();
    let sp_before = cpu.register(RegisterId::SP);

    cpu.step().unwrap(); // CALL
    assert_eq!(cpu.register(RegisterId::PC), 0x0110);
    assert_eq!(cpu.register(RegisterId::SP), sp_before - 2);

    cpu.step().unwrap(); // LD A
    cpu.step().unwrap(); // RET
    assert_eq!(cpu.register(RegisterId::SP), sp_before);
    assert_eq!(cpu.register(RegisterId::PC), 0x0106);
    assert_eq!(cpu.register(RegisterId::A), 0x42);
}

#[test]
fn test_push_pop_swap() {
    let program: &[u8] = &[
        0x31, 0xFE, 0xFF, // LD SP, 0xFFFE
        0x01, 0x11, 0x11, // LD BC, 0x1111
        0x11, 0x22, 0x22, // LD DE, 0x2222
        0xC5,             // PUSH BC
        0xD5,             // PUSH DE
        0xC1,             // POP BC
        0xD1,             // POP DE
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::BC), 0x2222);
    assert_eq!(cpu.register(RegisterId::DE), 0x1111);
    assert_eq!(cpu.register(RegisterId::SP), 0xFFFE);
}

#[test]
fn test_memory_fill() {
    let program: &[u8] = &[
        0x21, 0x00, 0xC0, // LD HL, 0xC000
        0x3E, 0x11,       // LD A, 0x11
        0x22,             // LD (HL+), A
        0x22,             // LD (HL+), A
        0x3C,             // INC A
        0x77,             // LD (HL), A
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.read_memory(0xC000), 0x11);
    assert_eq!(cpu.read_memory(0xC001), 0x11);
    assert_eq!(cpu.read_memory(0xC002), 0x12);
    assert_eq!(cpu.register(RegisterId::HL), 0xC002);
}

#[test]
fn test_bcd_addition() {
    let program: &[u8] = &[
        0x3E, 0x45,       // LD A, 0x45
        0xC6, 0x38,       // ADD A, 0x38
        0x27,             // DAA
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::A), 0x83); // 45 + 38 = 83
    assert!(!cpu.flags().contains(Flags::C));
}

#[test]
fn test_cb_bit_ops() {
    let program: &[u8] = &[
        0x3E, 0xF0,       // LD A, 0xF0
        0xCB, 0x37,       // SWAP A
        0xCB, 0xFF,       // SET 7, A
        0xCB, 0x87,       // RES 0, A
        0xCB, 0x47,       // BIT 0, A
        0x76,             // HALT
    ];

    let cpu = run_to_halt(program, 1000);

    assert_eq!(cpu.register(RegisterId::A), 0x8E);
    assert!(cpu.flags().contains(Flags::Z));
    assert!(cpu.flags().contains(Flags::H));
}

#[test]
fn test_illegal_opcode_fault_persists() {
    let rom = create_test_rom(&[0x00, 0x00, 0xDD]);
    let mut cpu = Cpu::new(&rom).unwrap();

    let expected = CpuError::IllegalOpcode(Fault {
        pc: 0x0102,
        opcode: 0xDD,
    });
    assert_eq!(cpu.run(1000), Err(expected.clone()));
    assert!(matches!(cpu.state(), CpuState::Faulted(_)));
    assert_eq!(cpu.step(), Err(expected.clone()));
    assert_eq!(cpu.step(), Err(expected));

    cpu.reset().unwrap();
    assert_eq!(cpu.step().unwrap(), 4);
}

#[test]
fn test_external_io_hooks() {
    // Wait until a collaborator writes a non-zero value to 0xFF80
    let program: &[u8] = &[
        0xF0, 0x80,       // loop: LDH A, (0x80)
        0xB7,             // OR A
        0x28, 0xFB,       // JR Z, loop
        0x76,             // HALT
    ];

    let rom = create_test_rom(program);
    let mut cpu = Cpu::new(&rom).unwrap();

    cpu.run(400).unwrap();
    assert_eq!(cpu.state(), CpuState::Fetching);

    cpu.write_memory(0xFF80, 0x07);
    cpu.run(400).unwrap();
    assert_eq!(cpu.state(), CpuState::Halted);
    assert_eq!(cpu.register(RegisterId::A), 0x07);
}

#[test]
fn test_halt_resumes_on_interrupt_signal() {
    let program: &[u8] = &[
        0x76,             // HALT
        0x3E, 0x99,       // LD A, 0x99
        0x76,             // HALT
    ];

    let mut cpu = run_to_halt(program, 100);
    assert_eq!(cpu.run(100).unwrap(), 0);

    cpu.signal_interrupt();
    cpu.run(100).unwrap();

    assert_eq!(cpu.register(RegisterId::A), 0x99);
    assert_eq!(cpu.state(), CpuState::Halted);
}

#[test]
fn test_stop_handle_from_another_thread() {
    let rom = create_test_rom(&[0x18, 0xFE]); // JR -2 (spin forever)
    let mut cpu = Cpu::new(&rom).unwrap();
    let handle = cpu.stop_handle();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        handle.request_stop();
    });

    let consumed = cpu.run(u64::MAX).unwrap();
    stopper.join().unwrap();

    assert!(consumed > 0);
    assert_eq!(consumed % 12, 0);
    assert_eq!(cpu.register(RegisterId::PC), 0x0100);
}

#[test]
fn test_disassemble_program() {
    let rom = create_test_rom(&[0x31, 0xFE, 0xFF, 0xCB, 0x11, 0xC3, 0x00, 0x01]);
    let cpu = Cpu::new(&rom).unwrap();

    let mut addr = 0x0100u16;
    let mut listing = Vec::new();
    for _ in 0..3 {
        let entry = cpu.disassemble(addr).unwrap();
        listing.push(entry.to_string());
        addr += entry.length() as u16;
    }

    assert_eq!(listing, ["LD SP, d16", "RL C", "JP d16"]);
    assert_eq!(addr, 0x0108);
}
