/*!
  An assembler and virtual machine for a small instruction set with fixed width 32 bit
  instructions. Assembly text is turned into a stream of machine words by
  `bytecode::assemble`; `vm::Machine` executes the words against an operand stack, a single
  accumulator and a fixed size memory.

  ```text
  text -> [`bytecode::assemble`] -> words + assembly log ->⋯

  ⋯-> [`vm::Machine::execute`] -> execution trace + memory dump
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod config;
pub mod driver;
pub mod dump;
pub mod error;
pub mod inspect;
pub mod state;
pub mod vm;

pub use bytecode::{assemble, Instruction, Operation, Program};
pub use config::MachineConfig;
pub use error::{Error, Result};
pub use vm::{execute, Machine, Termination};
