//! Block Icon Renderer CLI
//!
//! Render Minecraft block and item icons from versioned game assets.

use block_icon_renderer::{
    AssetCache, AssetCacheConfig, ItemClassifier, Rasterizer, RenderConfig, RenderCoordinator,
    RenderOptions, ResourcePack, TintColors, TintProvider, ViewRotation,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "block-icon-renderer")]
#[command(author, version, about = "Render Minecraft block and item icons", long_about = None)]
struct Cli {
    /// Directory for downloaded versions, extracted assets and rendered icons
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Days before cached version data is refreshed
    #[arg(long, global = true, default_value = "30")]
    ttl_days: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RenderArgs {
    /// Output width in pixels
    #[arg(long, default_value = "128")]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "128")]
    height: u32,

    /// Pixels per model unit (default: derived from the size)
    #[arg(long)]
    scale: Option<u32>,

    /// Camera pitch in degrees
    #[arg(long, default_value = "-30", allow_hyphen_values = true)]
    pitch: f32,

    /// Camera yaw in degrees
    #[arg(long, default_value = "45", allow_hyphen_values = true)]
    yaw: f32,

    /// Camera roll in degrees
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    roll: f32,

    /// Biome for tinting (e.g., "plains", "swamp", "jungle")
    #[arg(long)]
    biome: Option<String>,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        let options = RenderOptions::new(self.width, self.height)
            .with_rotation(ViewRotation::new(self.pitch, self.yaw, self.roll));
        match self.scale {
            Some(scale) => options.with_scale(scale),
            None => options,
        }
    }

    fn tint(&self) -> TintColors {
        self.biome
            .as_deref()
            .map(TintColors::for_biome)
            .unwrap_or_default()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render an item icon through the render cache
    Render {
        /// Item id (e.g., "minecraft:stone" or "stone")
        item: String,

        /// Game version, or "latest"
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Resource pack directory layered over the game assets
        #[arg(short, long)]
        resource_pack: Option<PathBuf>,

        /// Also copy the PNG here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render a block model directly, bypassing the cache
    Block {
        /// Model location (e.g., "block/stone")
        model: String,

        /// Resource pack directory; game assets are used when omitted
        #[arg(short, long)]
        resource_pack: Option<PathBuf>,

        /// Game version, or "latest"
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// List the items of a version that render as 3D blocks
    Items {
        /// Game version, or "latest"
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// List every item, not only 3D ones
        #[arg(long)]
        all: bool,
    },

    /// Print an item's display name
    Label {
        /// Item id
        item: String,

        /// Game version, or "latest"
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Language code
        #[arg(short, long, default_value = "en_us")]
        lang: String,
    },

    /// Download and extract a version's assets
    Fetch {
        /// Game version, or "latest"
        #[arg(default_value = "latest")]
        version: String,

        /// Ignore cached copies
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AssetCacheConfig::default().with_ttl(Duration::from_secs(cli.ttl_days * 24 * 60 * 60));
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_root(dir);
    }
    let renders_dir = config.cache_root.join("renders");
    let assets = AssetCache::new(config)?;

    match cli.command {
        Commands::Render {
            item,
            version,
            resource_pack,
            output,
            render,
        } => {
            let config = RenderConfig::default()
                .with_cache_dir(renders_dir)
                .with_tint(render.tint());
            let coordinator = RenderCoordinator::for_version(&assets, &version, resource_pack, &config).await?;
            let options = render.options();
            let png = coordinator.render(&item, &options).await?;

            let id = block_icon_renderer::paths::canonical_item_id(&item)?;
            let cached = coordinator.cache_path(&id, &options);
            match output {
                Some(output) => {
                    if let Some(parent) = output.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&output, &png)?;
                    println!("{}", output.display());
                }
                None => println!("{}", cached.display()),
            }
        }

        Commands::Block {
            model,
            resource_pack,
            version,
            output,
            render,
        } => {
            let pack = match resource_pack {
                Some(root) => ResourcePack::from_dir(root),
                None => ResourcePack::from_dir(assets.get_assets(&version, false).await?),
            };
            let rasterizer = Rasterizer::new(pack).with_tints(TintProvider::with_colors(render.tint()));
            let options = render.options();
            let written = tokio::task::spawn_blocking(move || rasterizer.render_block(&model, &output, &options)).await??;
            println!("{}", written.display());
        }

        Commands::Items { version, all } => {
            let classifier = ItemClassifier::new(assets);
            let items = if all {
                classifier.get_item_ids(&version).await?
            } else {
                classifier.get_3d_items(&version).await?.to_vec()
            };
            for item in items {
                println!("{}", item);
            }
        }

        Commands::Label { item, version, lang } => {
            let classifier = ItemClassifier::new(assets);
            println!("{}", classifier.get_item_label(&version, &item, &lang).await);
        }

        Commands::Fetch { version, force } => {
            let path = assets.get_assets(&version, force).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
