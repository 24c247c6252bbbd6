//! End-to-end pipeline behaviour on synthetic directory scans.

#![allow(clippy::unwrap_used)]

use image::RgbImage;
use malldir_pipeline::{PipelineParameters, RasterImage, trace};

/// White page with black filled rectangles `(x0, y0, x1, y1)`, half-open.
fn page(width: u32, height: u32, shops: &[(u32, u32, u32, u32)]) -> RasterImage {
    RasterImage::new(RgbImage::from_fn(width, height, |x, y| {
        let inside = shops
            .iter()
            .any(|&(x0, y0, x1, y1)| (x0..x1).contains(&x) && (y0..y1).contains(&y));
        if inside {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([255, 255, 255])
        }
    }))
}

fn two_shops() -> RasterImage {
    page(200, 100, &[(20, 20, 80, 80), (120, 20, 180, 80)])
}

#[test]
fn two_separated_rectangles_give_two_contours() {
    let out = trace(&two_shops(), &PipelineParameters::default()).unwrap();
    assert_eq!(out.contours.len(), 2);
    // Left shop first: raster order of boundary starts.
    let min_x = |i: usize| {
        out.contours[i]
            .vertices
            .points()
            .iter()
            .map(|p| p.x)
            .fold(f64::INFINITY, f64::min)
    };
    assert!(min_x(0) < min_x(1));
}

#[test]
fn contours_hug_the_drawn_rectangles() {
    let out = trace(&two_shops(), &PipelineParameters::default()).unwrap();
    let left = &out.contours[0];
    for p in left.vertices.points() {
        assert!((17.0..=82.0).contains(&p.x), "x {} outside shop", p.x);
        assert!((17.0..=82.0).contains(&p.y), "y {} outside shop", p.y);
    }
    // 60x60 shop: traced area is within a couple of pixels of the outline.
    assert!((3000.0..4500.0).contains(&left.area), "area {}", left.area);
}

#[test]
fn every_contour_meets_area_and_vertex_floors() {
    let params = PipelineParameters {
        min_area: 500,
        ..PipelineParameters::default()
    };
    let img = page(
        300,
        200,
        &[(10, 10, 30, 30), (50, 20, 140, 90), (160, 40, 280, 180)],
    );
    let out = trace(&img, &params).unwrap();
    assert!(!out.contours.is_empty());
    for c in &out.contours {
        assert!(c.vertices.len() >= 3, "{} has {} vertices", c.id, c.vertices.len());
        assert!(c.area >= f64::from(params.min_area), "{} area {}", c.id, c.area);
    }
}

#[test]
fn downscaled_run_maps_vertices_back_to_source_frame() {
    let img = page(800, 400, &[(80, 80, 320, 320), (480, 80, 720, 320)]);
    let params = PipelineParameters {
        max_dimension: 200,
        min_area: 100,
        ..PipelineParameters::default()
    };
    let out = trace(&img, &params).unwrap();
    assert!((out.scale - 0.25).abs() < f64::EPSILON);
    assert_eq!((out.working.width, out.working.height), (200, 100));
    assert_eq!(out.contours.len(), 2);

    for c in &out.contours {
        for p in c.vertices.points() {
            assert!(p.x >= 0.0 && p.x < 800.0 + 1.0 / out.scale);
            assert!(p.y >= 0.0 && p.y < 400.0 + 1.0 / out.scale);
            // Scaling back lands on a working-buffer pixel within rounding.
            let wx = p.x * out.scale;
            let wy = p.y * out.scale;
            assert!((wx - wx.round()).abs() < 1e-6 && (wy - wy.round()).abs() < 1e-6);
        }
    }
    // The first shop spans 80..320 in the source; vertices land near it.
    let xs: Vec<f64> = out.contours[0].vertices.points().iter().map(|p| p.x).collect();
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!((lo - 80.0).abs() <= 12.0, "lo {lo}");
    assert!((hi - 320.0).abs() <= 12.0, "hi {hi}");
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let img = two_shops();
    let params = PipelineParameters::default();
    let a = trace(&img, &params).unwrap();
    let b = trace(&img, &params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn smoothing_branch_also_finds_shops() {
    let params = PipelineParameters {
        binarize: false,
        ..PipelineParameters::default()
    };
    let out = trace(&two_shops(), &params).unwrap();
    assert!(!out.contours.is_empty());
    assert!(out.contours.len() <= 2);
}

#[test]
fn raising_min_area_drops_everything() {
    let params = PipelineParameters {
        min_area: 1_000_000,
        ..PipelineParameters::default()
    };
    let out = trace(&two_shops(), &params).unwrap();
    assert!(out.contours.is_empty());
}

#[test]
fn parameters_round_trip_through_json() {
    let params = PipelineParameters {
        canny_low: 12,
        invert_binary: true,
        rectilinear: Some(malldir_pipeline::RectilinearSnap::default()),
        ..PipelineParameters::default()
    };
    let json = serde_json::to_string(&params).unwrap();
    let back: PipelineParameters = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);

    let partial: PipelineParameters = serde_json::from_str(r#"{"min_area": 50}"#).unwrap();
    assert_eq!(partial.min_area, 50);
    assert_eq!(partial.canny_high, PipelineParameters::DEFAULT_CANNY_HIGH);
}
