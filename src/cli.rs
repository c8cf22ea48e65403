//! Command Line Interface (CLI) arguments.

use clap::Parser;

/// Projection server command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "PROJECTION_SERVER_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 10000, env = "PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "PROJECTION_SERVER_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/projection-server/certs/cert.pem",
        env = "PROJECTION_SERVER_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/projection-server/certs/key.pem",
        env = "PROJECTION_SERVER_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "PROJECTION_SERVER_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Root directory of the dataset store. Each subdirectory is a dataset.
    #[arg(long, default_value = "data", env = "PROJECTION_SERVER_STORE_ROOT")]
    pub store_root: String,
    /// Name of the label file within each dataset directory
    #[arg(long, default_value = "labels.npy", env = "PROJECTION_SERVER_LABEL_FILE")]
    pub label_file: String,
    /// Name of the worst point annotation file within each dataset directory
    #[arg(
        long,
        default_value = "E2_targets.json",
        env = "PROJECTION_SERVER_WORST_POINT_FILE"
    )]
    pub worst_point_file: String,
    /// Name of the nearest pair annotation file within each dataset directory
    #[arg(
        long,
        default_value = "E3_targets.json",
        env = "PROJECTION_SERVER_NEAREST_PAIR_FILE"
    )]
    pub nearest_pair_file: String,
    /// Name of the densest cluster annotation file within each dataset directory
    #[arg(
        long,
        default_value = "E4_targets.json",
        env = "PROJECTION_SERVER_DENSEST_CLUSTER_FILE"
    )]
    pub densest_cluster_file: String,
    /// Directory into which submitted results are spooled for the mailer
    #[arg(long, default_value = "spool", env = "PROJECTION_SERVER_SPOOL_DIR")]
    pub spool_dir: String,
    /// Subject line of result backup mails
    #[arg(
        long,
        default_value = "New study result",
        env = "PROJECTION_SERVER_MAIL_SUBJECT"
    )]
    pub mail_subject: String,
    /// Sender address of result backup mails
    #[arg(long, default_value = "", env = "PROJECTION_SERVER_MAIL_FROM")]
    pub mail_from: String,
    /// Receiver address of result backup mails
    #[arg(long, default_value = "", env = "PROJECTION_SERVER_MAIL_TO")]
    pub mail_to: String,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CommandLineArgs::try_parse_from(["projection-server"]).unwrap();
        assert_eq!("0.0.0.0", args.host);
        assert_eq!("labels.npy", args.label_file);
        assert_eq!("E2_targets.json", args.worst_point_file);
        assert_eq!("E3_targets.json", args.nearest_pair_file);
        assert_eq!("E4_targets.json", args.densest_cluster_file);
        assert!(!args.https);
    }

    #[test]
    fn store_root_flag() {
        let args =
            CommandLineArgs::try_parse_from(["projection-server", "--store-root", "/srv/data"])
                .unwrap();
        assert_eq!("/srv/data", args.store_root);
    }
}
