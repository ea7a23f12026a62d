use adforge::{
    logger::{self, LogLevel, LoggerConfig},
    BedrockCampaignService, CampaignResult, CampaignSession, Config, CopyField, GenerationClient,
    HttpCampaignClient, ImageAsset, RefineOutcome, RefinementClient, RefinementWorkflow,
    SessionState, StylePreset, SubmitOutcome,
};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Call a running AdForge API.
    Http,
    /// Call Amazon Bedrock directly.
    Bedrock,
}

/// Turn a product photo into a marketing campaign.
#[derive(Debug, Parser)]
#[command(name = "adforge", version)]
struct Cli {
    /// Product photo (JPEG, PNG, WebP or GIF).
    image: PathBuf,

    /// Free-text creative direction for the copy.
    #[arg(long)]
    brief: Option<String>,

    #[arg(long, default_value = "professional")]
    style: StylePreset,

    #[arg(long, value_enum, default_value_t = Backend::Http)]
    backend: Backend,

    /// Refinement round as FIELD=INSTRUCTION, e.g. ad_headline="make it funnier".
    /// Consecutive rounds on the same field build on each other.
    #[arg(long = "refine", value_name = "FIELD=INSTRUCTION")]
    refine: Vec<String>,

    /// Where the styled image is written.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _ = dotenv::dotenv();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        std::env::var("ADFORGE_LOG")
            .ok()
            .and_then(|name| LogLevel::from_name(&name))
            .unwrap_or(LogLevel::Info)
    };
    logger::init_with_config(LoggerConfig::new().with_level(level))?;

    let config = Config::from_env();
    logger::log_config_info(&config);

    let rounds = cli
        .refine
        .iter()
        .map(|arg| parse_round(arg))
        .collect::<Result<Vec<_>, _>>()?;

    match cli.backend {
        Backend::Http => {
            let client = Arc::new(HttpCampaignClient::new(&config)?);
            run(client, &cli, rounds).await
        }
        Backend::Bedrock => {
            let service = BedrockCampaignService::new(config.bedrock.clone().unwrap_or_default()).await?;
            run(Arc::new(service), &cli, rounds).await
        }
    }
}

fn parse_round(arg: &str) -> Result<(CopyField, String), Box<dyn std::error::Error>> {
    let (field, instruction) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=INSTRUCTION, got {:?}", arg))?;
    Ok((field.parse()?, instruction.to_string()))
}

async fn run<C>(
    client: Arc<C>,
    cli: &Cli,
    rounds: Vec<(CopyField, String)>,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: GenerationClient + RefinementClient + 'static,
{
    let session = CampaignSession::new(Arc::clone(&client));
    session.select_image(ImageAsset::from_path(&cli.image)?);
    session.set_style(cli.style);
    session.set_creative_brief(cli.brief.clone());

    if session.submit().await != SubmitOutcome::Ready {
        let message = session.error().unwrap_or_else(|| "generation did not complete".into());
        log::error!("❌ {}", message);
        return Err(message.into());
    }

    let workflow = RefinementWorkflow::new(client, session.store());
    for (field, instruction) in rounds {
        if let Some(open) = workflow.view() {
            if open.field != field {
                workflow.save()?;
            }
        }
        if workflow.view().is_none() {
            workflow.open(field)?;
        }
        workflow.set_instruction(instruction.as_str())?;

        match workflow.refine().await {
            RefineOutcome::Applied => {
                if let Some(view) = workflow.view() {
                    log::info!("✏️  {} → {}", view.label, view.draft);
                }
            }
            RefineOutcome::Failed => {
                let notice = workflow.view().and_then(|view| view.notice);
                log::warn!("⚠️  {}", notice.unwrap_or_default());
            }
            outcome => log::debug!("refinement round ended as {:?}", outcome),
        }
    }
    if workflow.view().is_some() {
        workflow.save()?;
    }

    debug_assert_eq!(session.state(), SessionState::Ready);
    match session.result() {
        Some(result) => {
            print_campaign(&result);
            save_styled_image(&result, &cli.out)?;
        }
        None => log::warn!("campaign disappeared before it could be printed"),
    }
    Ok(())
}

fn print_campaign(result: &CampaignResult) {
    let product = &result.product_analysis;
    println!("\nCampaign Ready: {}", product.name);
    println!("[{}] [{}]\n", product.category, product.mood);
    for field in CopyField::ALL {
        println!("{}:\n  {}\n", field.label(), result.marketing_copy.field_text(field));
    }
}

fn save_styled_image(
    result: &CampaignResult,
    out: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(styled) = &result.styled_image else {
        log::warn!("🖼️  Styled image not available");
        return Ok(());
    };

    let path = out.join(format!("adforge-{}.png", file_slug(&result.product_analysis.name)));
    fs::create_dir_all(out)?;
    fs::write(&path, styled.decode()?)?;
    log::info!("💾 Styled image saved to: {}", path.display());
    Ok(())
}

/// Lowercase words of `name` joined by `-`; anything but letters and digits
/// separates words, so the slug is always a single path component.
fn file_slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "campaign".to_string()
    } else {
        slug
    }
}
