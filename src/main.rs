use clap::Parser;
use strongbox::cli::commands::add::AddArgs;
use strongbox::cli::{init_logging, Cli, Commands};
use strongbox::crypto::password::PasswordClasses;

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => strongbox::cli::commands::init::execute(&cli),
        Commands::List => strongbox::cli::commands::list::execute(&cli),
        Commands::Show { number, reveal } => {
            strongbox::cli::commands::show::execute(&cli, number, reveal)
        }
        Commands::Add {
            ref name,
            ref group,
            ref username,
            ref email,
            ref url,
            ref comment,
            generate,
        } => strongbox::cli::commands::add::execute(
            &cli,
            &AddArgs {
                name,
                group,
                username,
                email,
                url,
                comment,
                generate,
            },
        ),
        Commands::Edit {
            number,
            ref field,
            ref value,
        } => strongbox::cli::commands::edit::execute(&cli, number, field, value.as_deref()),
        Commands::Delete { number, force } => {
            strongbox::cli::commands::delete::execute(&cli, number, force)
        }
        Commands::Generate {
            length,
            no_uppercase,
            no_lowercase,
            no_digits,
            no_punctuation,
        } => strongbox::cli::commands::generate::execute(
            length,
            PasswordClasses {
                uppercase: !no_uppercase,
                lowercase: !no_lowercase,
                digits: !no_digits,
                punctuation: !no_punctuation,
            },
        ),
        Commands::Passphrase { ref new_keyfile } => {
            strongbox::cli::commands::passphrase::execute(&cli, new_keyfile.as_deref())
        }
        Commands::Keyfile { ref path } => strongbox::cli::commands::keyfile::execute(path),
    };

    if let Err(e) = result {
        strongbox::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
