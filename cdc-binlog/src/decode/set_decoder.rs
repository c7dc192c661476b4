use cdc_common::err::{CResult, ReError};

use crate::event::RawValue;

/// Decodes the `Set` kind per the SET bitmap rule.
///
/// The source represents a SET as a 64-bit integer whose bit 0 corresponds
/// to the *last* declared value (reverse of declaration order). To decode:
/// render the integer in binary, left-pad to `set_values.len()` bits,
/// reverse the bit string to logical order, then emit `set_values[i]` for
/// every bit set to 1 at index `i`. Result preserves declaration order.
pub fn decode_set(raw: &RawValue, set_values: &[String]) -> CResult<Vec<String>> {
    if set_values.is_empty() {
        return Ok(Vec::new());
    }
    let bits = raw.as_i64().ok_or_else(|| {
        ReError::TypeMismatch(format!("Set kind expects an integer bitmap, got {:?}", raw))
    })?;
    if bits < 0 {
        return Err(ReError::TypeMismatch(format!(
            "Set bitmap must be non-negative, got {}",
            bits
        )));
    }
    let width = set_values.len();
    let reversed_bits = format!("{:0width$b}", bits, width = width);
    let logical_order: Vec<char> = reversed_bits.chars().rev().collect();

    let mut result = Vec::with_capacity(set_values.len());
    for (index, bit) in logical_order.iter().enumerate() {
        if *bit == '1' {
            result.push(set_values[index].clone());
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<String> {
        vec!["Set1", "Set2", "Set3", "Set4", "Set5"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn reverse_bitmap_rule_example_from_spec() {
        // reversed bits 00101 -> logical order 10100 -> Set1, Set3
        let decoded = decode_set(&RawValue::I64(5), &values()).unwrap();
        assert_eq!(decoded, vec!["Set1".to_string(), "Set3".to_string()]);
    }

    #[test]
    fn single_value_list_bit0_is_the_only_value() {
        let values = vec!["OnlyOne".to_string()];
        let decoded = decode_set(&RawValue::I64(1), &values).unwrap();
        assert_eq!(decoded, vec!["OnlyOne".to_string()]);
    }

    #[test]
    fn empty_set_values_yields_empty_sequence() {
        let decoded = decode_set(&RawValue::I64(5), &[]).unwrap();
        assert!(decoded.is_empty());
    }
}
