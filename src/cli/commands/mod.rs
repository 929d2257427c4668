//! One module per subcommand; each exposes `execute`.

pub mod add;
pub mod delete;
pub mod edit;
pub mod generate;
pub mod init;
pub mod keyfile;
pub mod list;
pub mod passphrase;
pub mod show;
