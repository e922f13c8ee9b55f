fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use greatwire_protocol::{ControlFrame, Response, decode_size_line, encode_size};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads the exact bytes of a captured wire message.
    fn load_fixture(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Checks that `frame` encodes to the fixture bytes and that the fixture
    /// decodes back to `expected`.
    fn frame_test(name: &str, frame: ControlFrame, expected: ControlFrame) {
        let fixture = load_fixture(name);
        assert_eq!(
            frame.encode().as_bytes(),
            fixture.as_slice(),
            "encode mismatch for {name}:\n  wire: {}\n  Rust: {}",
            String::from_utf8_lossy(&fixture),
            frame.encode()
        );

        let decoded = ControlFrame::decode(&fixture)
            .unwrap_or_else(|e| panic!("failed to decode {name}: {e}"));
        assert_eq!(decoded, expected, "decode mismatch for {name}");
    }

    // --- Control frames ---

    #[test]
    fn fixture_upload_frame() {
        let frame = ControlFrame::upload("a.bin", 5000);
        frame_test("upload_frame.bin", frame.clone(), frame);
    }

    #[test]
    fn fixture_upload_sanitized_frame() {
        // The placeholder is not reversed on decode.
        frame_test(
            "upload_sanitized_frame.bin",
            ControlFrame::upload("a++b.txt", 12),
            ControlFrame::upload("a!!?b.txt", 12),
        );
    }

    #[test]
    fn fixture_download_frame() {
        let frame = ControlFrame::download("notes.txt");
        frame_test("download_frame.bin", frame.clone(), frame);
    }

    #[test]
    fn fixture_exit_frame() {
        frame_test("exit_frame.bin", ControlFrame::Exit, ControlFrame::Exit);
    }

    // --- Responses ---

    #[test]
    fn fixture_responses() {
        for (name, response) in [
            ("response_ok.bin", Response::Ok),
            ("response_abort.bin", Response::Abort),
        ] {
            let fixture = load_fixture(name);
            assert_eq!(response.as_bytes(), fixture.as_slice(), "{name}");
            assert_eq!(Response::parse(&fixture), Some(response), "{name}");
        }
    }

    #[test]
    fn fixture_size_line() {
        let fixture = load_fixture("size_line.bin");
        assert_eq!(encode_size(5000).as_bytes(), fixture.as_slice());

        let text = std::str::from_utf8(&fixture).unwrap();
        assert_eq!(decode_size_line(text).unwrap(), 5000);
    }
}
