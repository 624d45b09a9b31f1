//! End-to-end behavior of the rope: editing, line indexing, and the tree
//! shape after long random edit sequences.

use brope::{concat, CowContext, Interval, Rope, MAX_CHILDREN, MAX_LEAF};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn sample_text(rng: &mut StdRng, len: usize) -> String {
    const ALPHABET: &[char] = &['a', 'b', 'c', ' ', '\n', '\u{e9}', '\u{4e16}', '\u{1f600}'];
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

fn char_slice(text: &str, lo: usize, hi: usize) -> String {
    text.chars().skip(lo).take(hi - lo).collect()
}

#[test]
fn replace_suffix() {
    let rope = Rope::from("foobaz").edit(Interval::new(3, 6), &Rope::from("bar"));
    assert_eq!(rope.to_string(), "foobar");
}

#[test]
fn delete_inner_range() {
    let rope = Rope::from("foooobar").edit(Interval::new(1, 3), &Rope::new());
    assert_eq!(rope.to_string(), "foobar");
}

#[test]
fn insert_at_point() {
    let rope = Rope::from("fbar").edit(Interval::new(1, 1), &Rope::from("oo"));
    assert_eq!(rope.to_string(), "foobar");
}

#[test]
fn line_offsets_across_concat() {
    brope_log::test();
    let ctx = CowContext::default();
    let rope = Rope::from(concat(
        &ctx,
        Rope::from("foo\nbar\n").into_node(),
        Rope::from("baz\nquux\n").into_node(),
    ));

    assert_eq!(rope.offset_of_line(0), 0);
    assert_eq!(rope.offset_of_line(1), 4);
    assert_eq!(rope.offset_of_line(2), 8);
    assert_eq!(rope.offset_of_line(3), 12);
    assert_eq!(rope.line_of_offset(4), 1);
    assert_eq!(rope.line_of_offset(8), 2);

    // Out of range queries saturate.
    assert_eq!(rope.offset_of_line(40), rope.len());
    assert_eq!(rope.line_of_offset(400), 4);
}

#[test]
fn blank_lines() {
    let rope = Rope::from("\n\n\n");
    assert_eq!(rope.line_count(), 4);
    for line in 0..4 {
        assert_eq!(rope.get_line(line), "", "line {line}");
    }
}

#[test]
fn empty_rope() {
    let rope = Rope::new();
    assert_eq!(rope.len(), 0);
    assert_eq!(rope.line_count(), 1);
    assert_eq!(rope.offset_of_line(0), 0);
    assert_eq!(rope.line_of_offset(0), 0);
    assert_eq!(rope.get_line(0), "");
    assert_eq!(rope.to_string(), "");
    assert_eq!(Rope::from(""), rope);
}

#[test]
fn large_build_with_inserts_stays_balanced() {
    brope_log::test();
    let chunk = "abcdefghijklmnopqrstuvwxyz0123456"; // 33 chars
    assert_eq!(chunk.chars().count(), 33);

    let mut writer = brope::RopeWriter::new();
    for _ in 0..65536 {
        std::fmt::Write::write_str(&mut writer, chunk).expect("fmt write");
    }
    let mut rope = writer.finish().expect("complete stream");
    rope.validate().expect("balanced after build");
    assert_eq!(rope.len(), 65536 * 33);

    let mut expected_len = rope.len();
    for (i, offset) in [0, 1, 33, 1000, 500_000, 1_000_000, 2_000_000, 65536 * 33]
        .into_iter()
        .enumerate()
    {
        let inserted = format!("<insert {i}>");
        rope = rope.insert(offset, &inserted);
        expected_len += inserted.chars().count();
        rope.validate().expect("balanced after insert");
        assert_eq!(rope.slice(offset..offset + inserted.len()).to_string(), inserted);
    }
    assert_eq!(rope.to_string().chars().count(), expected_len);
    assert_eq!(rope.len(), expected_len);
}

#[test]
fn inverse_law_holds_for_every_line() {
    let mut rng = StdRng::seed_from_u64(7);
    let text = sample_text(&mut rng, 20_000);
    let rope = Rope::from(text.as_str());
    for line in 0..rope.line_count() {
        assert_eq!(rope.line_of_offset(rope.offset_of_line(line)), line);
    }
}

#[test]
fn lines_join_back_to_text() {
    let mut rng = StdRng::seed_from_u64(11);
    let text = sample_text(&mut rng, 12_000);
    let rope = Rope::from(text.as_str());
    assert_eq!(rope.to_string().chars().count(), rope.len());

    let lines: Vec<String> = (0..rope.line_count()).map(|n| rope.get_line(n)).collect();
    assert_eq!(lines.join("\n"), text);
    let expected: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines, expected);
}

#[test]
fn empty_edit_is_identity() {
    let text = "0123456789\n".repeat(700);
    let rope = Rope::from(text.as_str());
    for p in [0, 1, 5000, rope.len()] {
        let edited = rope.edit(Interval::new(p, p), &Rope::new());
        assert_eq!(edited, rope);
        edited.validate().expect("balanced");
    }
}

#[test]
fn edit_round_trip_restores_text() {
    let mut rng = StdRng::seed_from_u64(23);
    let text = sample_text(&mut rng, 8_000);
    let rope = Rope::from(text.as_str());
    for _ in 0..50 {
        let a = rng.gen_range(0..=rope.len());
        let b = rng.gen_range(a..=rope.len());
        let ins_len = rng.gen_range(0..3000);
        let ins = Rope::from(sample_text(&mut rng, ins_len));

        let edited = rope.edit(Interval::new(a, b), &ins);
        let restored = edited.edit(Interval::new(a, a + ins.len()), &rope.slice(a..b));
        assert_eq!(restored.to_string(), text);
        restored.validate().expect("balanced");
    }
}

#[test]
fn random_edits_match_string_model() {
    brope_log::test();
    let mut rng = StdRng::seed_from_u64(0xb0b);
    let ctx = CowContext::default();
    let mut model = sample_text(&mut rng, 3000);
    let mut rope = Rope::from(model.as_str());
    let mut versions = vec![(rope.clone(), model.clone())];

    for step in 0..400 {
        let len = rope.len();
        let lo = rng.gen_range(0..=len);
        let hi = rng.gen_range(lo..=(lo + 2000).min(len));
        let ins_len = if rng.gen_bool(0.3) { 0 } else { rng.gen_range(0..1500) };
        let inserted = sample_text(&mut rng, ins_len);

        rope = rope.edit_with(&ctx, Interval::new(lo, hi), &Rope::from(inserted.as_str()));
        model = format!(
            "{}{}{}",
            char_slice(&model, 0, lo),
            inserted,
            char_slice(&model, hi, len)
        );

        if let Err(err) = rope.validate() {
            panic!("step {step}: {err}");
        }
        assert_eq!(rope.len(), model.chars().count(), "step {step}");
        if step % 25 == 0 {
            assert_eq!(rope.to_string(), model, "step {step}");
            versions.push((rope.clone(), model.clone()));
        }
    }

    assert_eq!(rope.to_string(), model);
    assert_eq!(rope.newline_count(), model.matches('\n').count());

    // Older versions were never disturbed by later in-place edits.
    for (old, text) in versions {
        assert_eq!(old.to_string(), text);
        old.validate().expect("balanced");
    }
}

#[test]
fn random_slices_match_string_model() {
    let mut rng = StdRng::seed_from_u64(99);
    let text = sample_text(&mut rng, 10 * MAX_LEAF);
    let rope = Rope::from(text.as_str());
    for _ in 0..200 {
        let lo = rng.gen_range(0..=rope.len());
        let hi = rng.gen_range(lo..=rope.len());
        let slice = rope.slice(lo..hi);
        slice.validate().expect("balanced");
        assert_eq!(slice.to_string(), char_slice(&text, lo, hi));
    }
}

#[test]
fn root_fanout_is_bounded() {
    let rope = Rope::from("z".repeat(MAX_LEAF * MAX_CHILDREN * MAX_CHILDREN + 1));
    rope.validate().expect("balanced");
    assert!(rope.root().children().len() <= MAX_CHILDREN);
    assert!(rope.root().height() >= 2);
}

#[test]
fn ropes_sharing_a_context_edit_concurrently() {
    brope_log::test();
    let ctx = CowContext::with_capacity(2);

    let results: Vec<(Rope, String)> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..2u64)
            .map(|seed| {
                let ctx = ctx.clone();
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed + 1000);
                    let mut model = sample_text(&mut rng, 4 * MAX_LEAF);
                    let mut rope = Rope::from(model.as_str());
                    for step in 0..200 {
                        let len = rope.len();
                        let lo = rng.gen_range(0..=len);
                        let hi = rng.gen_range(lo..=(lo + 1500).min(len));
                        let ins_len = rng.gen_range(0..1200);
                        let inserted = sample_text(&mut rng, ins_len);

                        rope = rope.edit_with(
                            &ctx,
                            Interval::new(lo, hi),
                            &Rope::from(inserted.as_str()),
                        );
                        model = format!(
                            "{}{}{}",
                            char_slice(&model, 0, lo),
                            inserted,
                            char_slice(&model, hi, len)
                        );
                        if let Err(err) = rope.validate() {
                            panic!("thread {seed} step {step}: {err}");
                        }
                        assert!(ctx.free_list().len() <= ctx.free_list().capacity());
                    }
                    (rope, model)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("edit thread panicked"))
            .collect()
    });

    for (rope, model) in results {
        assert_eq!(rope.to_string(), model);
        rope.validate().expect("balanced");
    }
    assert!(ctx.free_list().len() <= ctx.free_list().capacity());
    assert_eq!(ctx.free_list().capacity(), 2);
}
