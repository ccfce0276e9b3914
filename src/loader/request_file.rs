use std::io;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::api::config_dto::RequestLineDto;
use crate::error::Result;

/// Loads an agent's request file, one `family,hour,party_size` per line.
pub fn load_requests(file_path: impl AsRef<Path>) -> Result<Vec<RequestLineDto>> {
    let file_path = file_path.as_ref();
    log::info!("Loading requests from '{}'.", file_path.display());

    let file = std::fs::File::open(file_path)?;
    parse_requests(file)
}

/// Parses request lines from any reader.
///
/// Blank lines and `#` comments are ignored. Lines that cannot be parsed are
/// skipped with a warning instead of failing the whole file.
pub fn parse_requests<R: io::Read>(reader: R) -> Result<Vec<RequestLineDto>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(false).trim(Trim::All).flexible(true).comment(Some(b'#')).from_reader(reader);

    let mut requests = Vec::new();
    for (index, record) in csv_reader.deserialize::<RequestLineDto>().enumerate() {
        match record {
            Ok(request) if request.family.is_empty() => {
                log::warn!("Skipping request #{}: family name is empty.", index + 1);
            }
            Ok(request) => requests.push(request),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => log::warn!("Skipping malformed request #{}: {}", index + 1, e),
        }
    }

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_lines_and_skips_blanks() {
        let input = "Zuluaga, 8, 10\n\nDominguez,9,4\n# comment\n  Rojas ,12 , 1\n";
        let requests = parse_requests(input.as_bytes()).unwrap();

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], RequestLineDto { family: "Zuluaga".to_string(), hour: 8, party_size: 10 });
        assert_eq!(requests[2].family, "Rojas");
        assert_eq!(requests[2].hour, 12);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = "Zuluaga,eight,10\nDominguez,9\nRojas,12,1\n";
        let requests = parse_requests(input.as_bytes()).unwrap();

        assert_eq!(requests, vec![RequestLineDto { family: "Rojas".to_string(), hour: 12, party_size: 1 }]);
    }
}
