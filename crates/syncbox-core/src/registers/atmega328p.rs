//! ATmega328P register map.
//!
//! Addresses follow the canonical `m328Pdef.inc` memory-mapped I/O layout.
//! The 16-bit timer/counter and data registers are listed both as words and
//! as their 8-bit half views (`*L`/`*H`), matching the datasheet naming.

use super::RegisterWidth::{U16, U8};
use super::{Register, RegisterBank};

/// Full register table for the ATmega328P.
pub const REGISTERS: &[Register] = &[
    // 16-bit registers
    Register::new("UBRR0", 0xc4, U16),
    Register::new("OCR1B", 0x8a, U16),
    Register::new("OCR1A", 0x88, U16),
    Register::new("ICR1", 0x86, U16),
    Register::new("TCNT1", 0x84, U16),
    Register::new("ADC", 0x78, U16),
    Register::new("SP", 0x5d, U16),
    Register::new("EEAR", 0x41, U16),
    // UART
    Register::new("UDR0", 0xc6, U8),
    Register::new("UBRR0L", 0xc4, U8),
    Register::new("UBRR0H", 0xc5, U8),
    Register::new("UCSR0C", 0xc2, U8),
    Register::new("UCSR0B", 0xc1, U8),
    Register::new("UCSR0A", 0xc0, U8),
    // Timer/counter 2
    Register::new("OCR2B", 0xb4, U8),
    Register::new("OCR2A", 0xb3, U8),
    Register::new("TCNT2", 0xb2, U8),
    Register::new("TCCR2B", 0xb1, U8),
    Register::new("TCCR2A", 0xb0, U8),
    // Timer/counter 1
    Register::new("OCR1BL", 0x8a, U8),
    Register::new("OCR1BH", 0x8b, U8),
    Register::new("OCR1AL", 0x88, U8),
    Register::new("OCR1AH", 0x89, U8),
    Register::new("ICR1L", 0x86, U8),
    Register::new("ICR1H", 0x87, U8),
    Register::new("TCNT1L", 0x84, U8),
    Register::new("TCNT1H", 0x85, U8),
    Register::new("TCCR1C", 0x82, U8),
    Register::new("TCCR1B", 0x81, U8),
    Register::new("TCCR1A", 0x80, U8),
    // ADC
    Register::new("DIDR1", 0x7f, U8),
    Register::new("DIDR0", 0x7e, U8),
    Register::new("ADMUX", 0x7c, U8),
    Register::new("ADCSRB", 0x7b, U8),
    Register::new("ADCSRA", 0x7a, U8),
    Register::new("ADCH", 0x79, U8),
    Register::new("ADCL", 0x78, U8),
    // Interrupt masks
    Register::new("TIMSK2", 0x70, U8),
    Register::new("TIMSK1", 0x6f, U8),
    Register::new("TIMSK0", 0x6e, U8),
    Register::new("PCMSK2", 0x6d, U8),
    Register::new("PCMSK1", 0x6c, U8),
    Register::new("PCMSK0", 0x6b, U8),
    Register::new("EICRA", 0x69, U8),
    Register::new("PCICR", 0x68, U8),
    // System control
    Register::new("OSCCAL", 0x66, U8),
    Register::new("PRR", 0x64, U8),
    Register::new("CLKPR", 0x61, U8),
    Register::new("WDTCSR", 0x60, U8),
    Register::new("SREG", 0x5f, U8),
    Register::new("SPH", 0x5e, U8),
    Register::new("SPL", 0x5d, U8),
    Register::new("SPMCSR", 0x57, U8),
    Register::new("MCUCR", 0x55, U8),
    Register::new("MCUSR", 0x54, U8),
    Register::new("SMCR", 0x53, U8),
    Register::new("ACSR", 0x50, U8),
    // SPI
    Register::new("SPDR", 0x4e, U8),
    Register::new("SPSR", 0x4d, U8),
    Register::new("SPCR", 0x4c, U8),
    Register::new("GPIOR2", 0x4b, U8),
    Register::new("GPIOR1", 0x4a, U8),
    // Timer/counter 0
    Register::new("OCR0B", 0x48, U8),
    Register::new("OCR0A", 0x47, U8),
    Register::new("TCNT0", 0x46, U8),
    Register::new("TCCR0B", 0x45, U8),
    Register::new("TCCR0A", 0x44, U8),
    Register::new("GTCCR", 0x43, U8),
    // EEPROM
    Register::new("EEARH", 0x42, U8),
    Register::new("EEARL", 0x41, U8),
    Register::new("EEDR", 0x40, U8),
    Register::new("EECR", 0x3f, U8),
    Register::new("GPIOR0", 0x3e, U8),
    // External interrupts
    Register::new("EIMSK", 0x3d, U8),
    Register::new("EIFR", 0x3c, U8),
    Register::new("PCIFR", 0x3b, U8),
    Register::new("TIFR2", 0x37, U8),
    Register::new("TIFR1", 0x36, U8),
    Register::new("TIFR0", 0x35, U8),
    // I/O ports
    Register::new("PORTD", 0x2b, U8),
    Register::new("DDRD", 0x2a, U8),
    Register::new("PIND", 0x29, U8),
    Register::new("PORTC", 0x28, U8),
    Register::new("DDRC", 0x27, U8),
    Register::new("PINC", 0x26, U8),
    Register::new("PORTB", 0x25, U8),
    Register::new("DDRB", 0x24, U8),
    Register::new("PINB", 0x23, U8),
];

/// The ATmega328P register bank.
pub const BANK: RegisterBank = RegisterBank::new(REGISTERS);
