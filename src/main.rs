//! # 通用图片加载节点 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果输出，
//! 用本地文件系统宿主驱动库中的加载器。业务逻辑详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image_loader_node::error::AppError;
use image_loader_node::image_loader::{
    ImageLoader, LoaderConfig, LoaderOutput, NODE_INFO, PresentMode, SourceInputs,
};

/// 从粘贴 / 文件路径 / Base64 / 上传文件加载图片，输出张量摘要
#[derive(Parser)]
#[command(name = "image-loader-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 宿主输入目录
    #[arg(long, env = "IMAGE_LOADER_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// 保存模式与 `[output]` 标注的目录
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// 预览模式与 `[temp]` 标注的目录
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SourceArgs {
    #[arg(long)]
    pasted: Option<String>,
    #[arg(long)]
    filepath: Option<String>,
    #[arg(long)]
    base64: Option<String>,
    #[arg(long)]
    upload: Option<String>,
}

impl From<SourceArgs> for SourceInputs {
    fn from(args: SourceArgs) -> Self {
        SourceInputs {
            pasted: args.pasted,
            filepath: args.filepath,
            base64: args.base64,
            upload: args.upload,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PresentArg {
    Preview,
    Save,
}

impl From<PresentArg> for PresentMode {
    fn from(arg: PresentArg) -> Self {
        match arg {
            PresentArg::Preview => PresentMode::Preview,
            PresentArg::Save => PresentMode::Save,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// 加载图片并输出图像/遮罩摘要
    Load {
        #[command(flatten)]
        sources: SourceArgs,

        /// 同时交给宿主预览或保存
        #[arg(long, value_enum)]
        present: Option<PresentArg>,
    },

    /// 输出变更签名
    Signature {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// 输出输入声明与节点元信息
    Schema,

    /// 校验上传文件是否仍然存在
    Validate {
        #[arg(long)]
        upload: String,
    },
}

fn build_config(cli: &Cli) -> Result<LoaderConfig, AppError> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load_from_path(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(dir) = &cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.temp_dir {
        config.temp_dir = Some(dir.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let loader = ImageLoader::local(build_config(&cli)?);

    match cli.command {
        Command::Load { sources, present } => {
            let inputs = SourceInputs::from(sources);
            let output = match present {
                Some(mode) => loader.load_with_preview(&inputs, mode.into()),
                None => {
                    let loaded = loader.load(&inputs);
                    LoaderOutput {
                        image: loaded.image,
                        mask: loaded.mask,
                        previews: Vec::new(),
                    }
                }
            };

            let summary = serde_json::json!({
                "image_shape": output.image.shape(),
                "mask_shape": output.mask.shape(),
                "mean_opacity": output.mask.mean().unwrap_or(0.0),
                "previews": output.previews,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Signature { sources } => {
            println!("{}", ImageLoader::signature(&SourceInputs::from(sources)));
        }
        Command::Schema => {
            let document = serde_json::json!({
                "node": NODE_INFO,
                "input": loader.input_schema(),
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Command::Validate { upload } => {
            let inputs = SourceInputs::default().with_upload(upload);
            if let Err(err) = loader.validate_inputs(&inputs) {
                let message: String = err.into();
                println!("{}", message);
                return Ok(ExitCode::FAILURE);
            }
            println!("ok");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("执行失败: {err}");
            ExitCode::FAILURE
        }
    }
}
