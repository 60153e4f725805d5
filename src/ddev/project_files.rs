//! # Framework Project Files
//!
//! Small adjustments to the application tree for specific DDEV project types.

use regex::{NoExpand, Regex};
use std::sync::LazyLock;

static APP_URL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^APP_URL=.*$")
        .expect("Failed to compile APP_URL regex - this should never happen")
});

static DB_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^DB_(HOST|DATABASE|USERNAME|PASSWORD)=.*$")
        .expect("Failed to compile DB_ regex - this should never happen")
});

/// Laravel `.env` content derived from `.env.example`
///
/// `APP_URL` points at the DDEV site and database settings at the DDEV
/// database container.
#[must_use]
pub fn laravel_env(example: &str, primary_url: &str) -> String {
    let app_url = format!("APP_URL={primary_url}");
    let with_url = APP_URL_LINE.replace_all(example, NoExpand(&app_url));
    DB_LINE.replace_all(&with_url, "DB_${1}=db").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laravel_env_rewrites_url_and_database() {
        let example = "APP_NAME=Laravel\nAPP_URL=http://localhost\nDB_CONNECTION=mysql\nDB_HOST=127.0.0.1\nDB_PORT=3306\nDB_DATABASE=laravel\nDB_USERNAME=root\nDB_PASSWORD=\n";
        let env = laravel_env(example, "https://shop.ddev.site");

        assert_eq!(
            env,
            "APP_NAME=Laravel\nAPP_URL=https://shop.ddev.site\nDB_CONNECTION=mysql\nDB_HOST=db\nDB_PORT=3306\nDB_DATABASE=db\nDB_USERNAME=db\nDB_PASSWORD=db\n"
        );
    }

    #[test]
    fn test_dollar_in_url_is_literal() {
        let env = laravel_env("APP_URL=x\n", "https://a$1.ddev.site");
        assert_eq!(env, "APP_URL=https://a$1.ddev.site\n");
    }
}
