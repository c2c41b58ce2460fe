use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use rs_coaster::{App, AppOptions, SceneConfig, Shading};

/// 渲染过山车场景并逐帧输出 PNG
#[derive(Parser, Debug)]
#[command(name = "rs-coaster", version, about)]
struct Args {
    /// 场景 JSON 文件；省略时使用内置演示场景
    scene: Option<PathBuf>,
    /// 渲染帧数
    #[arg(long, default_value_t = 60)]
    frames: usize,
    /// 每帧时间步长（秒）
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f32,
    /// 输出目录
    #[arg(long, default_value = "frames")]
    out: PathBuf,
    #[arg(long, default_value_t = 1024)]
    width: usize,
    #[arg(long, default_value_t = 720)]
    height: usize,
    /// 超采样倍数
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=8))]
    ssaa: u8,
    /// 覆盖场景文件中的随机种子
    #[arg(long)]
    seed: Option<u64>,
    /// 覆盖场景文件中的着色方式
    #[arg(long, value_enum)]
    shading: Option<Shading>,
    /// 打印内置演示场景的 JSON 后退出
    #[arg(long)]
    print_demo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.print_demo {
        println!("{}", SceneConfig::demo().to_json()?);
        return Ok(());
    }

    let mut config = match &args.scene {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("加载场景 {} 失败", path.display()))?,
        None => {
            info!("未指定场景文件，使用内置演示场景");
            SceneConfig::demo()
        }
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(shading) = args.shading {
        config.shading = shading;
    }

    let options = AppOptions {
        frames: args.frames,
        dt: args.dt,
        out_dir: args.out,
        width: args.width,
        height: args.height,
        ssaa: args.ssaa as usize,
    };
    let mut app = App::new(&config, options).context("场景初始化失败")?;
    let saved = app.run().context("渲染失败")?;
    info!("共输出 {} 帧", saved.len());
    Ok(())
}
