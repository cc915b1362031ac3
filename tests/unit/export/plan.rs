use super::*;

fn fps(n: u32) -> Fps {
    Fps::whole(n).unwrap()
}

fn range(first: u64, last: u64) -> FrameRange {
    FrameRange::inclusive(FrameIndex(first), FrameIndex(last)).unwrap()
}

#[test]
fn image_plan_is_one_sorted_frame() {
    let plan = image_plan(2.5);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.frames[0].index, FrameIndex(0));
    assert_eq!(plan.frames[0].samples, vec![single(2.5)]);
    assert!(!plan.needs_accumulator());
}

#[test]
fn video_plan_covers_one_second_at_30fps() {
    let plan = video_plan(range(0, 29), fps(30), fps(30)).unwrap();
    assert_eq!(plan.len(), 30);
    for (k, frame) in plan.frames.iter().enumerate() {
        assert_eq!(frame.index, FrameIndex(k as u64));
        assert!((frame.samples[0].time_secs - k as f64 / 30.0).abs() < 1e-12);
    }
}

#[test]
fn video_plan_resamples_to_output_rate() {
    // Timeline frames 24..=48 at 24 fps span 1s starting at 1s; 60 fps output gives 61 frames.
    let plan = video_plan(range(24, 48), fps(24), fps(60)).unwrap();
    assert_eq!(plan.len(), 61);
    assert!((plan.frames[0].samples[0].time_secs - 1.0).abs() < 1e-12);
    assert!((plan.frames[60].samples[0].time_secs - 2.0).abs() < 1e-9);

    let single_frame = video_plan(range(7, 7), fps(30), fps(30)).unwrap();
    assert_eq!(single_frame.len(), 1);
}

#[test]
fn sequence_without_blur_keeps_frame_numbers() {
    let plan = sequence_plan(range(10, 12), fps(30), 1).unwrap();
    let indices: Vec<u64> = plan.frames.iter().map(|f| f.index.0).collect();
    assert_eq!(indices, vec![10, 11, 12]);
    assert!(!plan.needs_accumulator());
    assert_eq!(plan.total_samples(), 3);
}

#[test]
fn sequence_blur_compresses_numbering_and_handles_tail() {
    // 10 source frames, M = 4: groups of 4, 4, 2.
    let plan = sequence_plan(range(0, 9), fps(10), 4).unwrap();
    let indices: Vec<u64> = plan.frames.iter().map(|f| f.index.0).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(plan.needs_accumulator());

    let first = &plan.frames[0].samples;
    assert_eq!(first.len(), 4);
    assert!(!first[0].accumulate && first[0].skip_sort);
    assert!(first[1].accumulate && !first[1].skip_sort);
    assert!(first[2].accumulate && first[2].skip_sort);
    assert!(first[3].accumulate && first[3].skip_sort);

    let tail = &plan.frames[2].samples;
    assert_eq!(tail.len(), 2);
    assert!(!tail[0].accumulate);
    assert!(tail[1].accumulate);
    assert!((tail[1].time_secs - 0.9).abs() < 1e-12);
}

#[test]
fn lone_tail_frame_is_its_own_sample() {
    // 5 source frames starting at 20, M = 4: groups of 4 and 1.
    let plan = sequence_plan(range(20, 24), fps(10), 4).unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.frames[1].index, FrameIndex(21));
    let samples = &plan.frames[1].samples;
    assert_eq!(samples.len(), 1);
    assert!((samples[0].time_secs - 2.4).abs() < 1e-12);
    assert!(!samples[0].skip_sort);
    assert!(samples[0].accumulate);
}

#[test]
fn invalid_inputs() {
    assert!(sequence_plan(range(0, 3), fps(30), 0).is_err());
    let empty = FrameRange::new(FrameIndex(3), FrameIndex(3)).unwrap();
    assert!(sequence_plan(empty, fps(30), 1).is_err());
    assert!(video_plan(empty, fps(30), fps(30)).is_err());
}
