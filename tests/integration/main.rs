//! Integration tests for shellcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Nothing listens on the discard port, so every fetch fails fast
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn shellcache() -> Command {
        cargo_bin_cmd!("shellcache")
    }

    /// Isolated config, deployment and storage root
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::write(
                dir.path().join("deployment.json"),
                r#"{"resources": {"/": "h0", "main.dart.js": "h1"}, "core": ["main.dart.js"]}"#,
            )
            .unwrap();
            let config = format!(
                "[agent]\ndeployment = '{}'\n\n[storage]\nroot = '{}'\n",
                dir.path().join("deployment.json").display(),
                dir.path().join("regions").display()
            );
            std::fs::write(dir.path().join("config.toml"), config).unwrap();
            Self { dir }
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = shellcache();
            cmd.env_remove("SHELLCACHE_CONFIG")
                .arg("--config")
                .arg(self.config_path())
                .args(["--origin", UNREACHABLE]);
            cmd
        }
    }

    #[test]
    fn help_displays() {
        shellcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline caching agent"));
    }

    #[test]
    fn version_displays() {
        shellcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let ws = Workspace::new();
        shellcache()
            .arg("--config")
            .arg(ws.config_path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[regions]"))
            .stdout(predicate::str::contains("deployment.json"));
    }

    #[test]
    fn config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        shellcache()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(path.exists());
    }

    #[test]
    fn missing_origin_has_hint() {
        let dir = TempDir::new().unwrap();
        shellcache()
            .env_remove("SHELLCACHE_CONFIG")
            .arg("--config")
            .arg(dir.path().join("absent.toml"))
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("agent.origin"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn install_fails_against_unreachable_origin() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn deploy_stops_after_failed_install() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("deploy")
            .assert()
            .failure()
            .stdout(predicate::str::contains("previous cache left untouched"));

        ws.cmd()
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"pending\": null"));
    }

    #[test]
    fn activate_offline_then_status() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("fresh cache"));

        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("flutter-app-cache"))
            .stdout(predicate::str::contains("Up to date"));
    }

    #[test]
    fn unknown_message_is_ignored() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["message", "hello"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Message ignored"));
    }

    #[test]
    fn fetch_offline_without_cache_fails() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["fetch", "/"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hint:"));
    }
}
