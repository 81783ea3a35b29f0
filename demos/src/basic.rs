use anyhow::Context as _;
use tessa::{Color, Graphics};

const DEFAULT_COLORS: [&str; 2] = ["#ff0000", "rgba(0, 0, 255, 0.75)"];

/// A rect and a circle. Their fill colors can be given as `#rrggbb` or `rgba(..)` arguments.
pub fn run(args: &[String]) -> anyhow::Result<()> {
    let color = |i: usize| {
        let color = args.get(i).map_or(DEFAULT_COLORS[i], String::as_str);
        color
            .parse::<Color>()
            .with_context(|| format!("bad fill color '{color}'"))
    };
    let (rect, circle) = (color(0)?, color(1)?);

    let mut g = Graphics::new();

    g.begin_fill(rect.rgb(), rect.alpha())
        .draw_rect(0.0, 0.0, 50.0, 50.0)
        .begin_fill(circle.rgb(), circle.alpha())
        .draw_circle(100.0, 100.0, 25.0)
        .end_fill();

    if !g.prepare(false) {
        log::warn!("Geometry is waiting on a texture");
        return Ok(());
    }

    g.cx(|geometry| {
        for (i, part) in geometry.batches().iter().enumerate() {
            log::info!(
                "part {i}: color {:#08x}, indices {:?}, vertices {:?}",
                part.style.color,
                part.indices(),
                part.attributes()
            );
        }

        log::info!(
            "{} vertices, {} indices ({:?}), batchable: {}",
            geometry.points().len() / 2,
            geometry.index_buffer().len(),
            geometry.index_buffer().format(),
            geometry.is_batchable()
        );
    });

    log::info!("bounds: {:?}", g.bounds());
    Ok(())
}
