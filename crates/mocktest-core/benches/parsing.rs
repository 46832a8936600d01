use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mocktest_core::model::Marks;
use mocktest_core::parser::{parse_numbered_text, parse_structured};

fn bench_parse_structured(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_structured");

    let array = {
        let items: Vec<String> = (0..100)
            .map(|i| {
                format!(
                    r#"{{"question": "Question {i}?", "options": ["a{i}", "b{i}", "c{i}", "d{i}"], "correctAnswer": {}}}"#,
                    i % 4
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    };

    let object = {
        let items: Vec<String> = (0..100)
            .map(|i| {
                format!(
                    r#"{{"question": "Question {i}?", "options": {{"1": "a", "2": "b", "3": "c", "4": "d"}}, "correct_answer": {}}}"#,
                    i % 4 + 1
                )
            })
            .collect();
        format!(r#"{{"test_name": "bench", "questions": [{}]}}"#, items.join(","))
    };

    group.bench_function("array_100", |b| {
        b.iter(|| parse_structured(black_box(&array), Marks::default()))
    });

    group.bench_function("object_100", |b| {
        b.iter(|| parse_structured(black_box(&object), Marks::default()))
    });

    group.finish();
}

fn bench_parse_numbered_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_numbered_text");

    let text = {
        let mut s = String::from("Practice paper\n\n");
        for i in 1..=100 {
            s.push_str(&format!(
                "{i}. What is item {i}?\na) first\nb) second\nc) third\nd) fourth\n\n"
            ));
        }
        s
    };

    group.bench_function("questions=100", |b| {
        b.iter(|| parse_numbered_text(black_box(&text), Marks::default()))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_structured, bench_parse_numbered_text);
criterion_main!(benches);
