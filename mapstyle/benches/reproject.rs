//! Benchmarks pour la reprojection et la construction des expressions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;

use mapstyle::crs::CrsId;
use mapstyle::paint::{BooleanRule, CategoricalRule, LayerStyle, NumericRule};
use mapstyle::reproject;

/// Génère `n` carrés de 100 m en Lambert 93 autour de Paris
fn lambert93_collection(n: usize) -> GeoJson {
    let features = (0..n)
        .map(|i| {
            let x = 650_000.0 + (i % 100) as f64 * 100.0;
            let y = 6_860_000.0 + (i / 100) as f64 * 100.0;
            let ring = vec![
                vec![x, y],
                vec![x + 100.0, y],
                vec![x + 100.0, y + 100.0],
                vec![x, y + 100.0],
                vec![x, y],
            ];
            let mut properties = JsonObject::new();
            properties.insert("id".to_string(), json!(i));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn bench_reproject(c: &mut Criterion) {
    let from = CrsId::epsg(2154);
    let to = CrsId::wgs84();

    let mut group = c.benchmark_group("reproject_2154_to_4326");
    for n in [100usize, 1_000, 10_000] {
        let doc = lambert93_collection(n);
        group.throughput(Throughput::Elements((n * 5) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &doc, |b, doc| {
            b.iter(|| black_box(reproject::reproject(black_box(doc), &from, &to)))
        });
    }
    group.finish();
}

fn bench_fill_color(c: &mut Criterion) {
    let mut categories = CategoricalRule::new("kind");
    categories.values = (0..50)
        .map(|i| (format!("v{}", i), format!("#{:06x}", i * 4099)))
        .collect();

    let style = LayerStyle {
        boolean_styles: vec![BooleanRule {
            field: "public".into(),
            true_color: "#00ff00".into(),
            false_color: "#ff0000".into(),
            enabled: true,
        }],
        text_categories: Some(categories),
        rules: vec![NumericRule {
            field_a: "pop".into(),
            op: ">=".into(),
            field_b: "threshold".into(),
            color: "#ff00ff".into(),
        }],
        ..LayerStyle::default()
    };

    c.bench_function("fill_color_to_json", |b| {
        b.iter(|| black_box(style.fill_color().to_json()))
    });

    let expression = style.fill_color();
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("v49"));
    properties.insert("pop".to_string(), json!("12"));
    c.bench_function("fill_color_evaluate", |b| {
        b.iter(|| black_box(expression.evaluate(black_box(&properties))))
    });
}

criterion_group!(benches, bench_reproject, bench_fill_color);
criterion_main!(benches);
