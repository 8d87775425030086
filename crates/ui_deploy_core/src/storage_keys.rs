pub const ARCHIVE_KEY_PREFIX: &str = "ui-";
pub const ARCHIVE_KEY_SUFFIX: &str = ".zip";
/// Leading directory the UI build writes into; stripped once from every
/// archive entry before upload.
pub const DIST_PREFIX: &str = "dist/";

pub fn archive_object_key(revision: &str) -> String {
    format!("{ARCHIVE_KEY_PREFIX}{revision}{ARCHIVE_KEY_SUFFIX}")
}

pub fn deploy_path(entry_name: &str) -> &str {
    entry_name.strip_prefix(DIST_PREFIX).unwrap_or(entry_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_archive_key_from_revision() {
        assert_eq!(archive_object_key("abc123"), "ui-abc123.zip");
    }

    #[test]
    fn strips_single_dist_prefix() {
        assert_eq!(deploy_path("dist/index.html"), "index.html");
        assert_eq!(deploy_path("dist/assets/app.js"), "assets/app.js");
        assert_eq!(deploy_path("dist/dist/nested.js"), "dist/nested.js");
    }

    #[test]
    fn leaves_paths_outside_dist_untouched() {
        assert_eq!(deploy_path("robots.txt"), "robots.txt");
        assert_eq!(deploy_path("static/dist/app.js"), "static/dist/app.js");
    }
}
