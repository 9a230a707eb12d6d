use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxfsvg_config::{AppConfig, ConfigError};
use dxfsvg_frontend::{WorkflowOptions, cli};

/// 将 DXF 图纸转换为缩放后的 SVG，并输出尺寸、总长与填充面积。
#[derive(Debug, Parser)]
#[command(name = "dxfsvg", version)]
struct Args {
    /// 输入 DXF 文件
    input: PathBuf,
    /// 轮廓 SVG 输出路径，默认与输入同名
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 只转换指定名称的图框
    #[arg(long)]
    frame: Option<String>,
    #[arg(long)]
    canvas_size: Option<u32>,
    #[arg(long)]
    margin: Option<f64>,
    #[arg(long)]
    marker_layer: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// 保留填充 SVG 与 PNG
    #[arg(long)]
    keep_intermediates: bool,
    /// 仅打印文档中的图层与实体
    #[arg(long)]
    inspect: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut config, discovery_error) = load_configuration(args.config.as_ref())?;
    init_logging(&config);
    if let Some(err) = discovery_error {
        warn!(error = %err, "加载默认配置失败，使用内建默认值");
    }

    if args.inspect {
        cli::run_inspect(&args.input)?;
        return Ok(());
    }

    apply_overrides(&mut config, &args);
    let mut options = WorkflowOptions::from_config(&config).context("命令行参数无效")?;
    options.output = args.output.clone();

    info!(input = %args.input.display(), "开始转换");
    let report = dxfsvg_frontend::run(&args.input, &options)
        .with_context(|| format!("转换 {} 失败", args.input.display()))?;
    println!("{}", report.to_json()?);
    Ok(())
}

/// 显式指定的配置文件必须可用；自动发现失败时退回默认配置，错误待日志就绪后再报告。
fn load_configuration(
    explicit: Option<&PathBuf>,
) -> anyhow::Result<(AppConfig, Option<ConfigError>)> {
    match explicit {
        Some(path) => {
            let config = AppConfig::from_file(path)
                .with_context(|| format!("加载配置 {} 失败", path.display()))?;
            Ok((config, None))
        }
        None => match AppConfig::discover() {
            Ok(config) => Ok((config, None)),
            Err(err) => Ok((AppConfig::default(), Some(err))),
        },
    }
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    let conversion = &mut config.conversion;
    if let Some(frame) = &args.frame {
        conversion.frame_name = Some(frame.clone());
    }
    if let Some(canvas_size) = args.canvas_size {
        conversion.canvas_size = canvas_size;
    }
    if let Some(margin) = args.margin {
        conversion.margin_fraction = margin;
    }
    if let Some(layer) = &args.marker_layer {
        conversion.marker_layer_name = layer.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        conversion.timeout_ms = Some(timeout_ms);
    }
    if args.keep_intermediates {
        config.output.keep_intermediates = true;
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // 标准输出留给 JSON 报告
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
