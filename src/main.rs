use board_client::{
    client,
    config::{
        self,
        Args,
    },
    server_client::GameServerClient,
};
use clap::Parser;
use color_eyre::eyre::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _log_guard = config::init_tracing(args.log_dir())?;
    let app_config = args.app_config()?;
    tracing::info!(server = %app_config.server_url, "board client starting");

    if let Some(form) = args.new_game_form() {
        let server = GameServerClient::new(app_config.server_url.clone())?;
        client::create_game(&server, &form).await?;
    }
    client::run_app(app_config).await
}
