//! # Constants
//!
//! Shared constants used throughout the translator.
//!
//! File names and placeholder values here are part of the contract with DDEV
//! and with application code that reads the generated Platform.sh variables.

/// Sentinel marking a file as safely overwritable by this tool
pub const GENERATED_MARKER: &str = "#ddev-generated";

/// Description line written after the marker in generated YAML
pub const GENERATED_DESCRIPTION: &str =
    "# Generated configuration based on platform.sh project configuration";

/// Platform.sh application config, relative to the project root
pub const APP_CONFIG_FILE: &str = ".platform.app.yaml";

/// Platform.sh services config, relative to the project root
pub const SERVICES_CONFIG_FILE: &str = ".platform/services.yaml";

/// Platform.sh routes config, relative to the project root
pub const ROUTES_CONFIG_FILE: &str = ".platform/routes.yaml";

/// Platform.sh runtime environment script, relative to the project root
pub const ENVIRONMENT_SCRIPT_FILE: &str = ".environment";

/// DDEV override config, relative to the DDEV directory
pub const DDEV_CONFIG_FILE: &str = "config.platformsh.yaml";

/// Docker Compose fragment for service containers, relative to the DDEV directory
pub const COMPOSE_SERVICES_FILE: &str = "docker-compose.platformsh-services.yaml";

/// Web image build fragment, relative to the DDEV directory
pub const DOCKERFILE_FILE: &str = "web-build/Dockerfile.platformsh";

/// Copy of the `.environment` script, relative to the DDEV directory
pub const ENTRYPOINT_ENVIRONMENT_FILE: &str = "web-entrypoint.d/environment.sh";

/// Application directory inside the web container
pub const PLATFORM_APP_DIR: &str = "/var/www/html";

/// Fixed tree id; DDEV projects have no Platform.sh build tree
pub const PLATFORM_TREE_ID: &str = "2dc356f2fea13ef683f9adc5fc5bd28e05ad992a";

/// Parent of the per-project cache directory
pub const PLATFORM_CACHE_DIR_PREFIX: &str = "/mnt/ddev-global-cache/ddev-platformsh";

/// base64 of `{}`
pub const PLATFORM_VARIABLES_EMPTY: &str = "e30=";

/// Placeholder network facts for relationship entries
pub const RELATIONSHIP_IP: &str = "255.255.255.255";
pub const RELATIONSHIP_CLUSTER: &str = "ddev-dummy-cluster";

/// DDEV database container credentials
pub const DDEV_DB_HOST: &str = "db";
pub const DDEV_DB_CREDENTIAL: &str = "db";

/// Defaults when the app config omits a value
pub const DEFAULT_PHP_VERSION: &str = "8.1";
pub const DEFAULT_COMPOSER_VERSION: &str = "2";
pub const DEFAULT_DOCROOT: &str = "web";

/// Database synthesized when no relationship resolves to a database
pub const DEFAULT_DATABASE_RELATIONSHIP: &str = "database";
pub const DEFAULT_DATABASE_TYPE: &str = "mariadb";
pub const DEFAULT_DATABASE_VERSION: &str = "10.4";

/// Process exit codes, one per orchestrator abort reason
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_MISSING_FILE: i32 = 1;
pub const EXIT_VALIDATION: i32 = 2;
pub const EXIT_DATABASE_MISMATCH: i32 = 3;
pub const EXIT_WRITE_REFUSED: i32 = 4;
pub const EXIT_UNCAUGHT: i32 = 5;
pub const EXIT_UNSUPPORTED_APP: i32 = 6;

/// Default permissions for generated files
pub const GENERATED_FILE_MODE: u32 = 0o644;
