/*!

  Instructions are one 32 bit word each, stored big-endian. The top byte is the opcode; the
  remaining 24 bits hold at most two fields whose presence depends on the opcode's shape:

    Opcode:     8 bits   [31:24]
    Slot:       5 bits   [23:19]
    Immediate: 19 bits   [18:0]

  `STORE_TO_MEMORY` is the one exception. Its address field is 22 bits wide, [21:0], which
  leaves two bits, [23:22], for its slot. Keeping the fields disjoint is what makes every word
  decode to exactly one instruction.

  Unused bits are zero. Operands are range checked before packing and never truncated.

  There is one wire format. An earlier layout that stored a one byte opcode followed by an
  optional little-endian four byte operand is not supported.

*/

mod assembly;
mod binary;
mod instruction;
mod program;

pub use assembly::{assemble, assemble_line, assemble_lines, AssembledLine, Assembly, AssemblyRecord,
                   COMMENT_MARKER};
pub use binary::{bytes_to_words, check_fields, decode_word, encode_instruction, immediate_limit,
                 reserved_bits, slot_limit, words_to_bytes, Immediate, Slot, Word, WORD_BYTES};
pub use instruction::{Instruction, Operation, Shape};
pub use program::Program;
