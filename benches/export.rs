//! Benchmarks for beepex filtering, deduplication and page rendering.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench export -- render_thread`

use std::collections::BTreeSet;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use beepex::core::filter::{FilterRule, account_index, apply};
use beepex::core::models::{Chat, ChatPage, MediaEntry, Participant};
use beepex::core::output::{render_gallery, render_index, render_thread, text_to_html};
use beepex::media::{DedupIndex, MediaKind, fingerprint};
use beepex::{Attachment, Message};

use chrono::{Duration, TimeZone, Utc};

// =============================================================================
// Test Data Generators
// =============================================================================

fn generate_chats(count: usize) -> Vec<Chat> {
    (0..count)
        .map(|i| Chat::new(format!("c{i}"), format!("Chat {i}"), format!("a{}", i % 10)))
        .collect()
}

fn generate_messages(count: usize) -> Vec<Message> {
    let base_time = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    (0..count)
        .map(|i| {
            let ts = base_time + Duration::minutes(i as i64);
            let msg = Message::new(format!("m{i}"), "c1", if i % 2 == 0 { "Alice" } else { "Bob" }, ts)
                .with_text(format!(
                    "Message number {i}, see https://example.com/{i} <and> \"quotes\"\nsecond line"
                ));
            if i % 10 == 0 {
                msg.with_attachment(Attachment::new(format!("photo{i}.jpg"), "file:///x"))
            } else {
                msg
            }
        })
        .collect()
}

fn generate_media(count: usize) -> Vec<MediaEntry> {
    (0..count)
        .map(|i| MediaEntry {
            file_name: format!("2024-01-15_10-{:02}-00_photo{i}.jpg", i % 60),
            kind: MediaKind::Image,
            message_id: format!("m{}", i * 10),
            chat_id: "c1".into(),
            chat_name: format!("Chat {}", i % 50),
            thread_href: format!("Chat {}.html", i % 50),
            has_thumb: i % 3 != 0,
        })
        .collect()
}

// =============================================================================
// Filter Benchmarks
// =============================================================================

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let rules = vec![
        FilterRule::exclude_accounts(["a1", "a2"]),
        FilterRule::include_chats(["c11", "c21"]),
        FilterRule::exclude_chats(["c3", "c4", "c5"]),
    ];

    for size in [100_usize, 1_000, 10_000] {
        let chats = generate_chats(size);
        let all: BTreeSet<String> = chats.iter().map(|c| c.id.clone()).collect();
        let owners = account_index(&chats);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &(all, owners), |b, (all, owners)| {
            b.iter(|| black_box(apply(black_box(&rules), all, owners)));
        });
    }
    group.finish();
}

// =============================================================================
// Media Benchmarks
// =============================================================================

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_claim");

    for size in [100_usize, 1_000, 10_000] {
        // Every third payload repeats an earlier one
        let fingerprints: Vec<String> = (0..size)
            .map(|i| fingerprint(format!("payload {}", i - i / 3).as_bytes()))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &fingerprints, |b, fps| {
            b.iter(|| {
                let mut index = DedupIndex::new();
                for fp in fps {
                    black_box(index.claim(fp, "photo.jpg"));
                }
                black_box(index.len())
            });
        });
    }
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for size in [4_096_usize, 1 << 20, 8 << 20] {
        let bytes = vec![0xA5_u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| black_box(fingerprint(black_box(bytes))));
        });
    }
    group.finish();
}

// =============================================================================
// Rendering Benchmarks
// =============================================================================

fn bench_text_to_html(c: &mut Criterion) {
    let text = "Check https://example.com/a?b=1&c=2 and <this>, then \"that\".\n".repeat(20);
    c.bench_function("text_to_html", |b| {
        b.iter(|| black_box(text_to_html(black_box(&text))));
    });
}

fn bench_render_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_thread");
    let chat = Chat::new("c1", "Bench Chat", "a1")
        .with_network("WhatsApp")
        .with_participant(Participant::new("@alice", "Alice"))
        .with_participant(Participant::new("@bob", "Bob"));

    for size in [100_usize, 1_000, 10_000] {
        let messages = generate_messages(size);
        let media = generate_media(size / 10);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(messages, media),
            |b, (messages, media)| {
                b.iter(|| black_box(render_thread(&chat, black_box(messages), media)));
            },
        );
    }
    group.finish();
}

fn bench_render_gallery(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_gallery");

    for size in [100_usize, 1_000, 10_000] {
        let media = generate_media(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &media, |b, media| {
            b.iter(|| black_box(render_gallery(black_box(media)).unwrap()));
        });
    }
    group.finish();
}

fn bench_render_index(c: &mut Criterion) {
    let pages: Vec<ChatPage> = (0..1_000)
        .map(|i| ChatPage {
            chat_id: format!("c{i}"),
            title: format!("Chat {i}"),
            network: ["WhatsApp", "Signal", "Telegram", ""][i % 4].to_string(),
            href: format!("Chat {i}.html"),
            message_count: i * 3,
            media_count: i % 7,
        })
        .collect();
    let exported_at = Utc::now();
    c.bench_function("render_index_1000", |b| {
        b.iter(|| black_box(render_index(black_box(&pages), exported_at)));
    });
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_filter,
    bench_dedup,
    bench_fingerprint,
    bench_text_to_html,
    bench_render_thread,
    bench_render_gallery,
    bench_render_index,
);

criterion_main!(benches);
