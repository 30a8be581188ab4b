use std::path::PathBuf;
use std::process;

use clap::Parser;

use tileforge::descriptor::{AutoTileSpec, ObjectGroup, ObjectSpec, TileGroup, TileSpec};
use tileforge::elements::{FillElement, RectElement, ScatterElement, ScatterMask, ScatterNoise};
use tileforge::MapBuilder;

#[derive(Parser, Debug)]
#[command(name = "tileforge")]
#[command(about = "Generate procedural tile maps in the common editor JSON format")]
struct Args {
    /// Map id; also seeds the build when --seed is absent
    #[arg(short = 'm', long, default_value = "demo")]
    map_id: String,

    /// Width of the map in tiles
    #[arg(short = 'W', long, default_value = "80")]
    width: u32,

    /// Height of the map in tiles
    #[arg(short = 'H', long, default_value = "40")]
    height: u32,

    /// Number of layers (the two highest become collision and cover)
    #[arg(short = 'l', long, default_value = "10")]
    layers: u32,

    /// Random seed (hashed from the map id if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output path for the map JSON
    #[arg(short, long, default_value = "map.json")]
    output: PathBuf,

    /// Also write a raster preview PNG to this path
    #[arg(short, long)]
    preview: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("build failed: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = MapBuilder::new(&args.map_id, args.width, args.height)
        .with_layers(args.layers);
    if let Some(seed) = args.seed {
        builder = builder.with_seed(seed);
    }
    eprintln!("seed: {} (pass --seed {} to reproduce)", builder.seed(), builder.seed());

    // Demo template: meadow base, a winding pond, brush cover, and a hamlet.
    builder.add_element(
        FillElement::new("meadow", 0).with_tiles(
            TileGroup::new("ground")
                .add_tile(TileSpec::new("grass").rate(6))
                .add_tile(TileSpec::new("grass_tall").rate(2))
                .add_tile(TileSpec::new("dirt").rate(1)),
        ),
    )?;

    builder.add_element(
        ScatterElement::new(
            "pond",
            1,
            ScatterNoise::Double {
                coarse: 14.0,
                fine: 5.0,
            },
            ScatterMask::Band(0.62, 0.78),
        )
        .with_tiles(TileGroup::new("water").add_auto_tile(AutoTileSpec::new("water").collision(true))),
    )?;

    builder.add_element(
        ScatterElement::new(
            "brush",
            2,
            ScatterNoise::Perlin {
                scale: 4.0,
                octaves: 3,
            },
            ScatterMask::Above(0.8),
        )
        .with_tiles(TileGroup::new("bushes").add_tile(TileSpec::new("bush").cover(true))),
    )?;

    let hamlet_w = args.width / 3;
    let hamlet_h = args.height / 3;
    builder.add_element(
        RectElement::new(
            "hamlet",
            (args.width / 3) as i32,
            (args.height / 3) as i32,
            hamlet_w,
            hamlet_h,
            3,
        )
        .with_objects(
            ObjectGroup::new("buildings")
                .add_object(
                    ObjectSpec::new("house", 3, 2)
                        .collision(true)
                        .rate(2)
                        .function("enter", "house"),
                )
                .add_object(
                    ObjectSpec::new("well", 1, 1)
                        .collision(true)
                        .function("draw", "water"),
                ),
        ),
    )?;

    builder.build()?;

    let written = builder.export_map(&args.output)?;
    println!("map exported to {}", written.display());

    if let Some(preview) = &args.preview {
        let written = builder.preview_map(preview)?;
        println!("preview written to {}", written.display());
    }

    Ok(())
}
