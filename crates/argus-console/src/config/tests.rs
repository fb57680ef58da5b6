#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str("[backend]\n").expect("minimal config must parse");
        assert_eq!(config.backend.ws_url, "ws://localhost:8000");
        assert_eq!(config.source.mode, "live");
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.interval_secs, 5);
    }

    #[test]
    fn test_cctv_section_parses() {
        let raw = r#"
            [backend]
            ws_url = "ws://cam-gw:9000"

            [source]
            mode = "cctv"

            [source.cctv]
            ip = "192.168.1.20"
            username = "admin"
            password = "secret"
        "#;
        let config: Config = toml::from_str(raw).expect("cctv config must parse");
        assert_eq!(config.source.mode, "cctv");
        let cctv = config.source.cctv.expect("cctv section present");
        assert_eq!(cctv.ip, "192.168.1.20");
        assert_eq!(cctv.port, 554, "RTSP default port applies");
    }

    #[test]
    fn test_refresh_can_be_disabled() {
        let raw = "[backend]\n[refresh]\nenabled = false\n";
        let config: Config = toml::from_str(raw).expect("config must parse");
        assert!(!config.refresh.enabled);
    }
}
