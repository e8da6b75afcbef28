// Changes the process working directory, so it lives in its own test binary
// and holds a single test.

use std::path::PathBuf;

use cmd::commands::build_command;
use cmd::commands::watch::Watcher;
use cmd::common::{SiteArgs, SiteContext};
use sitegen::SiteEnv;
use tempfile::tempdir;

#[test]
fn test_build_from_current_directory() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    std::fs::write(tmp.path().join("index.md"), "# Home\n")?;
    std::fs::write(tmp.path().join("about.md"), "# About\n")?;
    std::fs::create_dir_all(tmp.path().join(".git"))?;
    std::fs::write(tmp.path().join(".git/notes.md"), "# Hidden\n")?;

    let previous = std::env::current_dir()?;
    std::env::set_current_dir(tmp.path())?;

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        let ctx = SiteContext::load(&SiteArgs {
            root: PathBuf::from("."),
            ..SiteArgs::default()
        })?;

        let watcher = Watcher::new(&ctx)?;
        assert_eq!(watcher.file_count(), 2);

        let report = build_command(&ctx, &SiteEnv::default())?;
        assert_eq!(report.pages.len(), 2);
        assert!(PathBuf::from("_site/index.html").is_file());
        assert!(PathBuf::from("_site/about/index.html").is_file());
        assert!(!PathBuf::from("_site/.git").exists());

        // A second build must not pick up its own output
        let report = build_command(&ctx, &SiteEnv::default())?;
        assert_eq!(report.pages.len(), 2);
        Ok(())
    })();

    std::env::set_current_dir(previous)?;
    result
}
