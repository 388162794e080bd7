use std::fs;
use std::io::Write;
use armviz::session::log::LogEntry;
use armviz::session::load_script_file;
use armviz::{Mode, Reg, Session, SessionLog, BREAK_MARKER};
use pretty_assertions::assert_eq;

#[test]
fn script_file_with_comments_and_break() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "# demo\nMOV sp, #0x1000\n\n.label table = 0x4000\n@@ break\nLDR r0, =table\nPUSH {{r0}}"
    )
    .unwrap();

    let lines = load_script_file(file.path()).unwrap();
    let mut s = Session::default();
    let load = s.load_script(lines, BREAK_MARKER);

    assert_eq!(load.results.len(), 2);
    assert_eq!(load.queued, 2);
    assert_eq!(s.labels().resolve("table"), Ok(0x4000));

    s.step_reserved().unwrap().result.unwrap();
    s.step_reserved().unwrap().result.unwrap();
    assert_eq!(s.cpu().register(Reg::R(0)), Some(0x4000));
    assert_eq!(s.stack().entries(Mode::UserSystem).next().map(|e| e.value), Some(0x4000));
}

#[test]
fn debug_log_records_before_and_after() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");

    let mut s = Session::default();
    s.attach_log(SessionLog::create(&path).unwrap());
    s.execute("MOV sp, #0x100").unwrap();
    s.execute("PUSH {sp}").unwrap();
    assert!(s.execute("BL somewhere").is_err());
    drop(s);

    let text = fs::read_to_string(&path).unwrap();
    let entries: Vec<LogEntry> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2, 3]);

    let push = &entries[1];
    assert_eq!(push.instruction, "PUSH {sp}");
    assert!(push.before.stack.is_empty());
    assert_eq!(push.after.stack[0].mode, "usr/sys");
    assert_eq!(push.after.stack[0].entries[0].address, 0xFC);
    assert_eq!(push.after.stack[0].entries[0].value, 0x100);

    let failed = &entries[2];
    assert!(failed.error.is_some());
    assert_eq!(failed.before, failed.after);
}
