use std::f32::consts::PI;

use tessa::{
    vec2, Color, FillStyle, Graphics, GraphicsConfig, LineCap, LineJoin, LineStyle, Mat3, Size,
    Texture,
};

/// Strokes, curves, holes and textures in one geometry, large enough to need its own draw calls.
pub fn run(_args: &[String]) -> anyhow::Result<()> {
    let config = GraphicsConfig {
        batchable_size: 64,
        ..Default::default()
    };
    let mut g = Graphics::with_config(config);

    // a rounded path with all three join kinds
    for (i, join) in [LineJoin::Miter, LineJoin::Bevel, LineJoin::Round]
        .into_iter()
        .enumerate()
    {
        let x = i as f32 * 120.0;
        g.line_texture_style(
            LineStyle::new(12.0, Color::ORANGE.rgb(), 1.0)
                .join(join)
                .cap(LineCap::Round),
        )
        .move_to(x, 0.0)
        .line_to(x + 50.0, 60.0)
        .line_to(x + 100.0, 0.0)
        .finish_poly();
    }

    g.line_style(4.0, Color::KHAKI.rgb(), 1.0)
        .move_to(0.0, 150.0)
        .quadratic_curve_to(60.0, 80.0, 120.0, 150.0)
        .bezier_curve_to(160.0, 220.0, 200.0, 80.0, 240.0, 150.0)
        .arc_to(300.0, 150.0, 300.0, 210.0, 30.0)
        .arc(300.0, 260.0, 50.0, -PI / 2.0, PI / 2.0, false)
        .finish_poly();

    // a frame with a window cut out of it
    g.line_style(2.0, Color::WHITE.rgb(), 1.0)
        .begin_fill(Color::DARK_GREEN.rgb(), 0.8)
        .draw_rounded_rect(400.0, 0.0, 200.0, 200.0, 24.0)
        .begin_hole()
        .draw_circle(500.0, 100.0, 50.0)
        .end_hole()
        .end_fill();

    // tiles on their own textures, rotated
    let textures = (0..10)
        .map(|_| Texture::new(Size::new(32.0, 32.0)))
        .collect::<Vec<_>>();
    for (i, texture) in textures.iter().enumerate() {
        let mut matrix = Mat3::from_translation(i as f32 * 40.0, 320.0);
        matrix.rotate(PI / 16.0);

        g.set_matrix(Some(matrix))
            .begin_texture_fill(FillStyle::textured(texture.clone(), 0xffffff, 1.0))
            .draw_rect(0.0, 0.0, 32.0, 32.0);
    }
    g.set_matrix(None).end_fill();

    g.line_texture_style(LineStyle::new(1.0, Color::GRAY.rgb(), 1.0).native(true))
        .draw_ellipse(700.0, 100.0, 80.0, 40.0);

    if !g.prepare(true) {
        log::warn!("Geometry is waiting on a texture");
        return Ok(());
    }

    g.cx(|geometry| {
        log::info!(
            "{} shapes, {} vertices, {} indices, {} parts, batchable: {}",
            geometry.graphics_data().len(),
            geometry.points().len() / 2,
            geometry.indices().len(),
            geometry.batches().len(),
            geometry.is_batchable()
        );

        for (i, call) in geometry.draw_calls().iter().enumerate() {
            log::info!(
                "draw call {i}: {:?} {}..{} with {} textures",
                call.topology,
                call.start,
                call.start + call.size,
                call.textures.len()
            );
        }

        log::info!(
            "{} packed vertices, {} index bytes",
            geometry.vertices().len(),
            geometry.index_buffer().as_bytes().len()
        );
    });

    for point in [vec2(500.0, 100.0), vec2(420.0, 20.0), vec2(700.0, 100.0)] {
        log::info!("hit {point:?}: {}", g.contains_point(point));
    }
    log::info!("bounds: {:?}", g.bounds());
    Ok(())
}
