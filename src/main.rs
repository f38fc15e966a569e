use anyhow::Result;
use chat_widget::{Position, WidgetConfig, commands, logging, ui};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-widget")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat widget for a remote conversational backend", long_about = None)]
struct Cli {
    /// Organization the conversation belongs to
    #[arg(long = "org", global = true)]
    organization_id: Option<u64>,

    /// Corner for the widget button, e.g. bottom-right
    #[arg(long, global = true)]
    position: Option<Position>,

    /// Backend root URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the widget (default)
    Run,
    /// Print the stored conversation
    History,
    /// Write the current settings, flags included, to the config file
    Init,
}

impl Cli {
    fn apply(&self, config: &mut WidgetConfig) {
        if let Some(id) = self.organization_id {
            config.organization_id = id;
        }
        if let Some(position) = self.position {
            config.position = position;
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = WidgetConfig::load()?;
    cli.apply(&mut config);

    match cli.command {
        None | Some(Commands::Run) => {
            logging::init(&config.log_path())?;
            ui::run(config).await
        }
        Some(Commands::History) => commands::show_history(&config),
        Some(Commands::Init) => commands::init_config(&config),
    }
}
