#![no_main]

use std::io::Cursor;

use bad_apple_core::{LineBuffer, LineRange};
use libfuzzer_sys::fuzz_target;

// Spool arbitrary bytes, then walk the full bisection tree and check that
// each pair of halves reproduces exactly the bytes of its parent.
fuzz_target!(|data: &[u8]| {
    let Ok(buffer) = LineBuffer::build(Cursor::new(data)) else {
        return;
    };
    let Some(full) = LineRange::full(buffer.len()) else {
        assert!(data.is_empty());
        return;
    };

    let mut whole = Vec::new();
    let written = buffer
        .write_range(full, &mut whole)
        .expect("full range is in bounds");
    assert_eq!(whole, data);
    assert_eq!(written, buffer.byte_len());

    let mut work = vec![full];
    let mut visited = 0usize;
    while let Some(range) = work.pop() {
        visited += 1;
        let Some([upper, lower]) = range.split() else {
            let line = buffer.line(range.start()).expect("single line is in bounds");
            let mut same = Vec::new();
            buffer.write_range(range, &mut same).expect("range is in bounds");
            assert_eq!(line, same);
            continue;
        };

        let mut parent = Vec::new();
        buffer.write_range(range, &mut parent).expect("range is in bounds");
        let mut halves = Vec::new();
        buffer.write_range(lower, &mut halves).expect("lower half is in bounds");
        buffer.write_range(upper, &mut halves).expect("upper half is in bounds");
        assert_eq!(parent, halves, "split of {range} lost or reordered bytes");

        work.extend([upper, lower]);
    }
    assert_eq!(visited, 2 * buffer.len() - 1);

    let past_end = LineRange::single(buffer.len());
    assert!(buffer.write_range(past_end, &mut Vec::new()).is_err());
});
