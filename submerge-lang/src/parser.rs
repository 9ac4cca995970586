use crate::Instruction;
use submerge_base::{err, Result};

/// Truncates a line at its first `//`, dropping both a leading comment line
/// and a trailing inline comment.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parses a single instruction line. Returns `Ok(None)` for a line that is
/// blank once comments are stripped.
pub fn parse_line(line: &str) -> Result<Option<Instruction>> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(None);
    }

    let open = line
        .find('(')
        .ok_or_else(|| err(format!("malformed instruction, missing '(': {line:?}")))?;
    if !line.ends_with(')') {
        return Err(err(format!("malformed instruction, missing ')': {line:?}")));
    }
    let verb = line[..open].trim();
    let args_str = &line[open + 1..line.len() - 1];
    let args: Vec<&str> = if args_str.trim().is_empty() {
        Vec::new()
    } else {
        args_str.split(',').map(|a| a.trim()).collect()
    };

    let instruction = match verb {
        "begin" => {
            let t = expect_arity(verb, &args, 1)?;
            Instruction::Begin(t[0].to_string())
        }
        "R" => {
            let a = expect_arity(verb, &args, 2)?;
            Instruction::Read(a[0].to_string(), a[1].to_string())
        }
        "W" => {
            let a = expect_arity(verb, &args, 3)?;
            let v = parse_int(verb, a[2])?;
            Instruction::Write(a[0].to_string(), a[1].to_string(), v)
        }
        "end" => {
            let a = expect_arity(verb, &args, 1)?;
            Instruction::End(a[0].to_string())
        }
        "fail" => {
            let a = expect_arity(verb, &args, 1)?;
            let s = parse_site(verb, a[0])?;
            Instruction::Fail(s)
        }
        "recover" => {
            let a = expect_arity(verb, &args, 1)?;
            let s = parse_site(verb, a[0])?;
            Instruction::Recover(s)
        }
        "dump" => {
            expect_arity(verb, &args, 0)?;
            Instruction::Dump
        }
        other => return Err(err(format!("unknown verb {other:?} in {line:?}"))),
    };
    Ok(Some(instruction))
}

fn expect_arity<'a>(verb: &str, args: &'a [&'a str], n: usize) -> Result<&'a [&'a str]> {
    if args.len() != n {
        return Err(err(format!(
            "{verb}() expects {n} argument(s), got {}",
            args.len()
        )));
    }
    Ok(args)
}

fn parse_int(verb: &str, s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| err(format!("{verb}() expects an integer argument, got {s:?}")))
}

fn parse_site(verb: &str, s: &str) -> Result<u32> {
    s.parse::<u32>()
        .map_err(|_| err(format!("{verb}() expects an integer site id, got {s:?}")))
}

/// Parses every line of a script, in order, skipping blank/comment-only
/// lines. The order of the returned instructions is the order the dispatcher
/// numbers 1..N for timestamps.
pub fn parse_script(text: &str) -> Result<Vec<Instruction>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(insn)) => out.push(insn),
            Ok(None) => {}
            Err(e) => return Err(err(format!("line {}: {:?}", lineno + 1, e))),
        }
    }
    Ok(out)
}
