use crate::error::SnapshotError;
use crate::types::InstrumentRecord;

pub const SNAPSHOT_VERSION: u8 = 1;

/// Снапшот кэша: байт версии + postcard payload со списком записей
pub fn encode_v1(records: &[InstrumentRecord]) -> Result<Vec<u8>, SnapshotError> {
    let mut out = Vec::new();
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&postcard::to_allocvec(records)?);
    Ok(out)
}

pub fn decode(buf: &[u8]) -> Result<Vec<InstrumentRecord>, SnapshotError> {
    let (&ver, payload) = buf.split_first().ok_or(SnapshotError::TooShort)?;
    if ver != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(ver));
    }
    Ok(postcard::from_bytes(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    fn rec(code: &str) -> InstrumentRecord {
        InstrumentRecord {
            code: code.to_string(),
            name: "名称".to_string(),
            series: vec![Bar {
                date: "2024-01-02".into(),
                open: 10.1,
                high: 10.5,
                low: 10.0,
                close: 10.3,
                volume: 15000,
            }],
        }
    }

    #[test]
    fn encode_decode_keeps_records_and_order() {
        let records = vec![rec("600000"), rec("000001")];
        let bytes = encode_v1(&records).unwrap();
        assert_eq!(bytes[0], SNAPSHOT_VERSION);
        assert_eq!(decode(&bytes).unwrap(), records);
    }

    #[test]
    fn empty_buffer_is_too_short() {
        assert!(matches!(decode(&[]), Err(SnapshotError::TooShort)));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = encode_v1(&[rec("600000")]).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(SnapshotError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncated_payload_is_postcard_error() {
        let bytes = encode_v1(&[rec("600000")]).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(decode(cut), Err(SnapshotError::Postcard(_))));
    }
}
