//! UDisks2 exposes paths as NUL-terminated byte arrays (`ay`).

pub fn decode_c_string_bytes(bytes: &[u8]) -> String {
    let raw = match bytes.split(|b| *b == 0).next() {
        Some(v) => v,
        None => bytes,
    };

    String::from_utf8_lossy(raw).to_string()
}

pub fn decode_mount_points(mount_points: Vec<Vec<u8>>) -> Vec<String> {
    mount_points
        .into_iter()
        .filter_map(|mp| {
            let decoded = decode_c_string_bytes(&mp);
            if decoded.is_empty() {
                None
            } else {
                Some(decoded)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_c_string_bytes_truncates_nul() {
        let bytes = b"/dev/sdb1\0garbage";
        assert_eq!(decode_c_string_bytes(bytes), "/dev/sdb1");
    }

    #[test]
    fn decode_mount_points_keeps_service_order_and_drops_empty() {
        let decoded = decode_mount_points(vec![
            b"/run/media/user/DISK\0".to_vec(),
            b"\0".to_vec(),
            Vec::new(),
            b"/mnt/b".to_vec(),
        ]);

        assert_eq!(
            decoded,
            vec!["/run/media/user/DISK".to_string(), "/mnt/b".to_string()]
        );
    }
}
