use std::fs;
use std::io::{self, Read, Write};
use std::str::FromStr;

use pem::{FromPem, Pem};
use tracing::debug;

use crate::error::{Error, Result};

/// Read input from a file or stdin
///
/// If `file` is `Some`, reads from the specified file path.
/// If `file` is `None`, reads from stdin.
pub(crate) fn read_input(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Write bytes to a file, or to stdout when `file` is `None`.
pub(crate) fn write_output(file: Option<&str>, bytes: &[u8]) -> Result<()> {
    match file {
        Some(path) => {
            debug!(path, len = bytes.len(), "writing output");
            Ok(fs::write(path, bytes)?)
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            Ok(stdout.flush()?)
        }
    }
}

/// Decodes PEM text when the input is a PEM block, otherwise DER.
pub(crate) fn decode_pem_or_der<T, E>(
    input: &[u8],
    from_der: impl Fn(&[u8]) -> std::result::Result<T, E>,
) -> Result<T>
where
    T: FromPem<Error = E>,
    Error: From<E>,
{
    let pem = std::str::from_utf8(input)
        .ok()
        .and_then(|text| Pem::from_str(text).ok());
    match pem {
        Some(pem) => {
            debug!(label = %pem.label(), "input is PEM");
            Ok(T::from_pem(&pem)?)
        }
        None => {
            debug!(len = input.len(), "input is not PEM, reading as DER");
            Ok(from_der(input)?)
        }
    }
}

/// Format binary data as hexadecimal dump
///
/// Returns a string formatted in hexdump style (similar to `xxd` command):
/// - 16 bytes per line
/// - Offset in hexadecimal
/// - Hex bytes with space separator
/// - ASCII representation on the right
pub(crate) fn format_hex_dump(data: &[u8]) -> String {
    const BYTES_PER_LINE: usize = 16;
    let mut output = String::new();

    for (offset, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        output.push_str(&format!("{:08x}  ", offset * BYTES_PER_LINE));

        for (i, byte) in chunk.iter().enumerate() {
            output.push_str(&format!("{:02x} ", byte));
            if i == 7 {
                output.push(' ');
            }
        }

        // pad short last line
        for i in chunk.len()..BYTES_PER_LINE {
            output.push_str("   ");
            if i == 7 {
                output.push(' ');
            }
        }

        output.push_str(" |");
        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                output.push(*byte as char);
            } else {
                output.push('.');
            }
        }
        output.push_str("|\n");
    }

    output
}
