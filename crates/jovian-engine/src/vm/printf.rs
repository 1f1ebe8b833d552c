//! `printf` for the VM
//!
//! Supports `%d %i %u %x %X %c %s %p %%` with the `-` and `0` flags and a
//! field width. Length modifiers are accepted and ignored; integer arguments
//! are 32-bit.

use super::memory::Memory;
use super::{VmError, VmResult};

struct Spec {
    left_align: bool,
    zero_pad: bool,
    width: usize,
}

impl Spec {
    fn pad(&self, text: &str, out: &mut Vec<u8>) {
        let len = text.chars().count();
        if len >= self.width {
            out.extend_from_slice(text.as_bytes());
            return;
        }
        let fill = self.width - len;
        if self.left_align {
            out.extend_from_slice(text.as_bytes());
            out.extend(std::iter::repeat(b' ').take(fill));
        } else if self.zero_pad {
            // zeros go after the sign
            let (sign, digits) = match text.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", text),
            };
            out.extend_from_slice(sign.as_bytes());
            out.extend(std::iter::repeat(b'0').take(fill));
            out.extend_from_slice(digits.as_bytes());
        } else {
            out.extend(std::iter::repeat(b' ').take(fill));
            out.extend_from_slice(text.as_bytes());
        }
    }
}

/// Widest field a conversion may request
pub const MAX_WIDTH: usize = 4096;

/// Render `format` with raw argument bits, reading `%s` strings from memory
pub fn format(format: &[u8], args: &[u64], memory: &Memory) -> VmResult<Vec<u8>> {
    let mut out = Vec::with_capacity(format.len());
    let mut args = args.iter().copied();
    let mut i = 0;

    while i < format.len() {
        let byte = format[i];
        i += 1;
        if byte != b'%' {
            out.push(byte);
            continue;
        }

        let mut spec = Spec {
            left_align: false,
            zero_pad: false,
            width: 0,
        };
        while i < format.len() && matches!(format[i], b'-' | b'0') {
            match format[i] {
                b'-' => spec.left_align = true,
                _ => spec.zero_pad = true,
            }
            i += 1;
        }
        while i < format.len() && format[i].is_ascii_digit() {
            spec.width = spec
                .width
                .checked_mul(10)
                .and_then(|w| w.checked_add((format[i] - b'0') as usize))
                .filter(|&w| w <= MAX_WIDTH)
                .ok_or_else(|| {
                    VmError::Printf(format!("field width exceeds {}", MAX_WIDTH))
                })?;
            i += 1;
        }
        while i < format.len() && matches!(format[i], b'l' | b'h') {
            i += 1;
        }

        let Some(&conversion) = format.get(i) else {
            out.push(b'%');
            break;
        };
        i += 1;

        if conversion == b'%' {
            out.push(b'%');
            continue;
        }

        let mut next_arg = || {
            args.next().ok_or_else(|| {
                VmError::Printf(format!("missing argument for %{}", conversion as char))
            })
        };

        match conversion {
            b'd' | b'i' => spec.pad(&(next_arg()? as u32 as i32).to_string(), &mut out),
            b'u' => spec.pad(&(next_arg()? as u32).to_string(), &mut out),
            b'x' => spec.pad(&format!("{:x}", next_arg()? as u32), &mut out),
            b'X' => spec.pad(&format!("{:X}", next_arg()? as u32), &mut out),
            b'c' => {
                let c = next_arg()? as u8;
                spec.pad(&(c as char).to_string(), &mut out)
            }
            b's' => {
                let bytes = memory.read_c_string(next_arg()?)?;
                spec.pad(&String::from_utf8_lossy(&bytes), &mut out)
            }
            b'p' => spec.pad(&format!("0x{:x}", next_arg()?), &mut out),
            other => {
                out.push(b'%');
                out.push(other);
            }
        }
    }

    Ok(out)
}
