/*!
  A snapshot of a contiguous range of memory, taken after the machine stops. It serializes as
  an object mapping `address_<i>` to the cell value, in address order:

  ```json
  { "address_10": 5, "address_11": 0 }
  ```
*/

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::state::Value;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryDump {
  start  : usize,
  values : Vec<Value>
}

impl MemoryDump {
  pub fn new(start: usize, values: Vec<Value>) -> MemoryDump {
    MemoryDump { start, values }
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// The value at the absolute `address`, if the dump covers it.
  pub fn get(&self, address: usize) -> Option<Value> {
    address
      .checked_sub(self.start)
      .and_then(|offset| self.values.get(offset).copied())
  }

  /// (address, value) pairs in address order.
  pub fn iter(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
    self.values
        .iter()
        .enumerate()
        .map(move |(offset, value)| (self.start + offset, *value))
  }
}

pub fn address_label(address: usize) -> String {
  format!("address_{}", address)
}

impl Serialize for MemoryDump {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.values.len()))?;
    for (address, value) in self.iter() {
      map.serialize_entry(&address_label(address), &value)?;
    }
    map.end()
  }
}

lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for MemoryDump {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (address, value) in self.iter() {
      table.add_row(row![r->address_label(address), value]);
    }

    write!(f, "{}", table)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn addresses_are_absolute(){
    let dump = MemoryDump::new(10, vec![5, 0, 7]);
    assert_eq!(dump.get(9), None);
    assert_eq!(dump.get(10), Some(5));
    assert_eq!(dump.get(12), Some(7));
    assert_eq!(dump.get(13), None);
    assert_eq!(dump.iter().collect::<Vec<_>>(), vec![(10, 5), (11, 0), (12, 7)]);
  }

  #[test]
  fn serializes_in_address_order(){
    let dump = MemoryDump::new(8, vec![1, 2, 3]);
    let json = serde_json::to_string(&dump).unwrap();
    assert_eq!(json, r#"{"address_8":1,"address_9":2,"address_10":3}"#);
  }

  #[test]
  fn renders_a_table(){
    let text = MemoryDump::new(0, vec![42]).to_string();
    assert!(text.contains("address_0"));
    assert!(text.contains("42"));
  }
}
