#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use base64::engine::general_purpose;
use base64::Engine;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use serde_json::Value;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ArtworkQuery;
use crate::domain::models::Credentials;
use crate::domain::models::GalleryQuery;
use crate::domain::models::GallerySort;
use crate::domain::models::ImageSource;
use crate::domain::models::NewArtwork;
use crate::domain::models::Paging;
use crate::domain::models::PortfolioTab;
use crate::domain::models::Publication;
use crate::domain::models::PublicScope;
use crate::domain::models::StorageName;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn arg_id(name: &'static str, help: &'static str) -> Arg {
    return Arg::new(name).help(help).num_args(1).required(true);
}

fn arg_tab() -> Arg {
    return Arg::new("tab")
        .short('t')
        .long("tab")
        .num_args(1)
        .help("Which part of the portfolio to show.")
        .value_parser(PossibleValuesParser::new(PortfolioTab::VARIANTS))
        .default_value("all");
}

fn arg_skip() -> Arg {
    return Arg::new("skip")
        .long("skip")
        .num_args(1)
        .value_parser(value_parser!(usize))
        .default_value("0")
        .help("How many entries to skip.");
}

fn arg_limit() -> Arg {
    return Arg::new("limit")
        .long("limit")
        .num_args(1)
        .value_parser(value_parser!(usize))
        .default_value("10")
        .help("Page size.");
}

fn subcommand_login() -> Command {
    return Command::new("login")
        .about("Signs in with a mini-program login code, or with dashboard credentials.")
        .arg(
            Arg::new("code")
                .long("code")
                .num_args(1)
                .help("Code returned by wx.login."),
        )
        .arg(
            Arg::new("user-info")
                .long("user-info")
                .num_args(1)
                .requires("code")
                .help("Profile JSON to send along with the login code."),
        )
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .num_args(1)
                .requires("password")
                .help("Dashboard username."),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .env("ATELIER_PASSWORD")
                .num_args(1)
                .help("Dashboard password."),
        )
        .group(
            ArgGroup::new("method")
                .args(["code", "username"])
                .required(true),
        );
}

fn subcommand_artworks() -> Command {
    return Command::new("artworks")
        .about("Create, inspect and publish artworks.")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("Lists your artworks, newest first.")
                .arg(arg_tab())
                .arg(arg_skip())
                .arg(arg_limit()),
        )
        .subcommand(
            Command::new("show")
                .about("Shows a single artwork.")
                .arg(arg_id("id", "Artwork id.")),
        )
        .subcommand(
            Command::new("progress")
                .about("Asks once how far a generation is.")
                .arg(arg_id("id", "Artwork id.")),
        )
        .subcommand(
            Command::new("create")
                .about("Starts generating an artwork from a source image.")
                .arg(
                    Arg::new("style")
                        .short('s')
                        .long("style")
                        .num_args(1)
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Style id, see `atelier styles`."),
                )
                .arg(
                    Arg::new("image-url")
                        .long("image-url")
                        .num_args(1)
                        .help("URL of an uploaded source image."),
                )
                .arg(
                    Arg::new("image-file")
                        .long("image-file")
                        .num_args(1)
                        .help("Local source image, sent inline."),
                )
                .group(
                    ArgGroup::new("image")
                        .args(["image-url", "image-file"])
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Publishes an artwork to the gallery, or takes it back.")
                .arg(arg_id("id", "Artwork id."))
                .arg(
                    Arg::new("private")
                        .long("private")
                        .action(ArgAction::SetTrue)
                        .help("Make the artwork private again."),
                )
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .num_args(1)
                        .value_parser(PossibleValuesParser::new(PublicScope::VARIANTS))
                        .default_value("result_only")
                        .help("What the gallery shows."),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Deletes an artwork.")
                .arg(arg_id("id", "Artwork id.")),
        )
        .subcommand(
            Command::new("watch")
                .about("Shows the portfolio and follows generations until they finish.")
                .arg(arg_tab()),
        );
}

fn subcommand_gallery() -> Command {
    return Command::new("gallery")
        .about("Browse what others have published.")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("Lists public artworks.")
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .num_args(1)
                        .value_parser(PossibleValuesParser::new(GallerySort::VARIANTS))
                        .default_value("latest")
                        .help("Newest first, most viewed or most liked."),
                )
                .arg(arg_skip())
                .arg(arg_limit()),
        )
        .subcommand(
            Command::new("open")
                .about("Shows a public artwork and counts the view.")
                .arg(arg_id("id", "Artwork id.")),
        );
}

fn subcommand_credits() -> Command {
    return Command::new("credits")
        .about("Shows your credit balance.")
        .subcommand(
            Command::new("history")
                .about("Lists how your balance changed.")
                .arg(arg_skip())
                .arg(arg_limit()),
        );
}

fn subcommand_styles() -> Command {
    return Command::new("styles")
        .about("Lists the available styles and what they cost.")
        .arg(
            Arg::new("category")
                .long("category")
                .num_args(1)
                .value_parser(value_parser!(i64))
                .help("Only styles of this category, see `atelier categories`."),
        );
}

fn subcommand_orders() -> Command {
    return Command::new("orders")
        .about("Credit purchase orders.")
        .subcommand_required(true)
        .subcommand(
            Command::new("status")
                .about("Confirms the payment of an order, retrying while it is processed.")
                .arg(
                    Arg::new("order-id")
                        .num_args(1)
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Order id."),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("Lists your orders, newest first.")
                .arg(arg_skip())
                .arg(arg_limit()),
        );
}

fn subcommand_cards() -> Command {
    return Command::new("cards")
        .about("Card keys.")
        .subcommand_required(true)
        .subcommand(
            Command::new("activate")
                .about("Redeems a card key for credits.")
                .arg(arg_id("card-key", "The card key to redeem.")),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_millis(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(format!("{help} [default: {}]", Config::default(key)))
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("atelier")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .subcommand(subcommand_login())
        .subcommand(Command::new("logout").about("Forgets the stored session."))
        .subcommand(Command::new("whoami").about("Shows the signed in account and its credits."))
        .subcommand(subcommand_artworks())
        .subcommand(subcommand_gallery())
        .subcommand(subcommand_orders())
        .subcommand(Command::new("products").about("Lists the credit packages for sale."))
        .subcommand(subcommand_credits())
        .subcommand(subcommand_cards())
        .subcommand(subcommand_styles())
        .subcommand(Command::new("categories").about("Lists the style categories."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("ATELIER_API_URL")
                .num_args(1)
                .help(format!("Base URL of the backend API. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("ATELIER_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Storage.to_string())
                .long(ConfigKey::Storage.to_string())
                .env("ATELIER_STORAGE")
                .num_args(1)
                .help(format!("Where the session is kept between runs. [default: {}]", Config::default(ConfigKey::Storage)))
                .value_parser(PossibleValuesParser::new(StorageName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StateFile.to_string())
                .long(ConfigKey::StateFile.to_string())
                .env("ATELIER_STATE_FILE")
                .num_args(1)
                .help(format!("Session file used by the file storage. [default: {}]", Config::default(ConfigKey::StateFile)))
                .global(true),
        )
        .arg(arg_millis(
            ConfigKey::RequestTimeout,
            "ATELIER_REQUEST_TIMEOUT",
            "Backend request timeout in milliseconds.",
        ))
        .arg(arg_millis(
            ConfigKey::PollInterval,
            "ATELIER_POLL_INTERVAL",
            "Milliseconds between generation status polls.",
        ))
        .arg(arg_millis(
            ConfigKey::RedirectDelay,
            "ATELIER_REDIRECT_DELAY",
            "Milliseconds between the login expired notice and the login prompt.",
        ))
        .arg(arg_millis(
            ConfigKey::RedirectDebounce,
            "ATELIER_REDIRECT_DEBOUNCE",
            "Milliseconds in which further login redirects are suppressed.",
        ))
        .arg(arg_millis(
            ConfigKey::PaymentInterval,
            "ATELIER_PAYMENT_INTERVAL",
            "Milliseconds between payment status checks.",
        ))
        .arg(
            Arg::new(ConfigKey::PaymentRetries.to_string())
                .long(ConfigKey::PaymentRetries.to_string())
                .env("ATELIER_PAYMENT_RETRIES")
                .num_args(1)
                .help(format!("How often a payment status is checked before giving up. [default: {}]", Config::default(ConfigKey::PaymentRetries)))
                .global(true),
        );
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    return matches
        .get_one::<String>(name)
        .with_context(|| return format!("Missing argument '{name}'"));
}

fn tab(matches: &ArgMatches) -> PortfolioTab {
    return matches
        .get_one::<String>("tab")
        .and_then(|e| return PortfolioTab::parse(e))
        .unwrap_or_default();
}

fn paging(matches: &ArgMatches) -> Paging {
    return Paging {
        skip: matches.get_one::<usize>("skip").copied().unwrap_or(0),
        limit: matches.get_one::<usize>("limit").copied().unwrap_or(10),
    };
}

async fn login_action(matches: &ArgMatches) -> Result<Action> {
    if let Some(code) = matches.get_one::<String>("code") {
        let user_info = match matches.get_one::<String>("user-info") {
            Some(text) => Some(
                serde_json::from_str::<Value>(text).context("--user-info must be valid JSON")?,
            ),
            None => None,
        };

        return Ok(Action::Login(Credentials::WeChat {
            code: code.to_string(),
            user_info,
        }));
    }

    return Ok(Action::Login(Credentials::Admin {
        username: required(matches, "username")?.to_string(),
        password: required(matches, "password")?.to_string(),
    }));
}

async fn artworks_action(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("list", list_matches)) => {
            let paging = paging(list_matches);
            return Ok(Action::ArtworkList(ArtworkQuery {
                skip: paging.skip,
                limit: paging.limit,
                tab: tab(list_matches),
            }));
        }
        Some(("show", show_matches)) => {
            return Ok(Action::ArtworkShow(required(show_matches, "id")?.to_string()));
        }
        Some(("progress", progress_matches)) => {
            return Ok(Action::ArtworkProgress(
                required(progress_matches, "id")?.to_string(),
            ));
        }
        Some(("create", create_matches)) => {
            let style_id = create_matches
                .get_one::<i64>("style")
                .copied()
                .context("Missing argument 'style'")?;

            let source = match create_matches.get_one::<String>("image-url") {
                Some(url) => ImageSource::Url(url.to_string()),
                None => {
                    let file = required(create_matches, "image-file")?;
                    let bytes = fs::read(file)
                        .await
                        .with_context(|| return format!("Failed to read image {file}"))?;
                    ImageSource::Inline(general_purpose::STANDARD.encode(bytes))
                }
            };

            return Ok(Action::ArtworkCreate(NewArtwork::new(style_id, source)));
        }
        Some(("publish", publish_matches)) => {
            let public_scope = publish_matches
                .get_one::<String>("scope")
                .and_then(|e| return PublicScope::parse(e))
                .unwrap_or_default();

            return Ok(Action::ArtworkPublish(
                required(publish_matches, "id")?.to_string(),
                Publication {
                    is_public: !publish_matches.get_flag("private"),
                    public_scope,
                },
            ));
        }
        Some(("delete", delete_matches)) => {
            return Ok(Action::ArtworkDelete(
                required(delete_matches, "id")?.to_string(),
            ));
        }
        Some(("watch", watch_matches)) => {
            return Ok(Action::ArtworkWatch(tab(watch_matches)));
        }
        _ => bail!("Unknown artworks command"),
    }
}

fn gallery_action(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("list", list_matches)) => {
            let paging = paging(list_matches);
            let sort = list_matches
                .get_one::<String>("sort")
                .and_then(|e| return GallerySort::parse(e))
                .unwrap_or_default();

            return Ok(Action::GalleryList(GalleryQuery {
                skip: paging.skip,
                limit: paging.limit,
                sort,
            }));
        }
        Some(("open", open_matches)) => {
            return Ok(Action::GalleryOpen(required(open_matches, "id")?.to_string()));
        }
        _ => bail!("Unknown gallery command"),
    }
}

/// Maps parsed arguments to the action to run, loading the configuration
/// along the way. None when the command was handled here already.
pub async fn action_from(matches: &ArgMatches) -> Result<Option<Action>> {
    let (name, subcmd_matches) = match matches.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            build().print_long_help()?;
            return Ok(None);
        }
    };

    match name {
        "completions" => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        "config" => {
            match subcmd_matches.subcommand() {
                Some(("create", _)) => create_config_file().await?,
                Some(("default", _)) => println!("{}", Config::serialize_default(build())),
                Some(("path", _)) => println!("{}", Config::default(ConfigKey::ConfigFile)),
                _ => subcommand_config().print_long_help()?,
            }
            return Ok(None);
        }
        _ => {}
    }

    let mut all_matches = vec![matches, subcmd_matches];
    if let Some((_, leaf_matches)) = subcmd_matches.subcommand() {
        all_matches.push(leaf_matches);
    }
    Config::load(build(), all_matches).await?;

    let action = match name {
        "login" => login_action(subcmd_matches).await?,
        "logout" => Action::Logout(),
        "whoami" => Action::WhoAmI(),
        "artworks" => artworks_action(subcmd_matches).await?,
        "orders" => match subcmd_matches.subcommand() {
            Some(("status", status_matches)) => Action::OrderStatus(
                status_matches
                    .get_one::<i64>("order-id")
                    .copied()
                    .context("Missing argument 'order-id'")?,
            ),
            Some(("list", list_matches)) => Action::OrderList(paging(list_matches)),
            _ => bail!("Unknown orders command"),
        },
        "gallery" => gallery_action(subcmd_matches)?,
        "products" => Action::ProductList(),
        "credits" => match subcmd_matches.subcommand() {
            Some(("history", history_matches)) => Action::CreditHistory(paging(history_matches)),
            _ => Action::Credits(),
        },
        "cards" => match subcmd_matches.subcommand() {
            Some(("activate", activate_matches)) => {
                Action::CardActivate(required(activate_matches, "card-key")?.to_string())
            }
            _ => bail!("Unknown cards command"),
        },
        "styles" => Action::StyleList(subcmd_matches.get_one::<i64>("category").copied()),
        "categories" => Action::CategoryList(),
        other => bail!(format!("Unknown command {}", other.bold())),
    };

    return Ok(Some(action));
}

pub async fn parse() -> Result<Option<Action>> {
    let matches = build().get_matches();
    return action_from(&matches).await;
}
