//! Postgres client installation inside a Debian-based pod.

const PGDG_REPO: &str = "http://apt.postgresql.org/pub/repos/apt";
const PGDG_KEY_URL: &str = "https://www.postgresql.org/media/keys/ACCC4CF8.asc";
const PGDG_SOURCES_LIST: &str = "/etc/apt/sources.list.d/pgdg.list";

/// Ordered (step name, pod command) pairs.
pub fn client_install_steps(version: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "install-lsb-release",
            "apt-get update && apt-get install -y lsb-release".to_string(),
        ),
        (
            "add-pgdg-source",
            format!(
                "echo \"deb {} $(lsb_release -cs)-pgdg main\" > {}",
                PGDG_REPO, PGDG_SOURCES_LIST
            ),
        ),
        (
            "add-pgdg-key",
            format!("wget --quiet -O - {} | apt-key add -", PGDG_KEY_URL),
        ),
        (
            "install-postgresql-client",
            format!(
                "apt-get update && apt-get -y install postgresql-client-{}",
                version.trim()
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_requested_client_version_last() {
        let steps = client_install_steps("15");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].1, "apt-get update && apt-get install -y lsb-release");
        assert_eq!(
            steps[3].1,
            "apt-get update && apt-get -y install postgresql-client-15"
        );
    }

    #[test]
    fn pgdg_source_uses_release_codename() {
        let steps = client_install_steps("12");
        assert_eq!(
            steps[1].1,
            "echo \"deb http://apt.postgresql.org/pub/repos/apt $(lsb_release -cs)-pgdg main\" > /etc/apt/sources.list.d/pgdg.list"
        );
    }
}
