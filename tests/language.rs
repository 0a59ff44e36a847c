use nelox::console::Console;
use nelox::interpreter::{self, Interpreter};
use nelox::printer::{pr_str, PrintMode};
use nelox::{evaluator, reader, Value};
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

/// Collects everything `print` writes so tests can inspect it afterwards.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn run_with_input(source: &str, input: &str) -> (interpreter::Result, String) {
    let output = SharedBuffer::default();
    let console = Console::new(Cursor::new(input.to_owned()), output.clone());
    let mut interpreter = Interpreter::with_console(console);
    let result = interpreter.interpret(source);
    (result, output.contents())
}

fn run(source: &str) -> Value {
    run_with_input(source, "")
        .0
        .unwrap_or_else(|e| panic!("{} failed: {}", source, e))
}

fn run_printed(source: &str) -> String {
    pr_str(&run(source), PrintMode::ReadableRepresentation)
}

fn output_of(source: &str, input: &str) -> String {
    let (result, output) = run_with_input(source, input);
    if let Err(e) = result {
        panic!("program failed: {}\n{}", e, source);
    }
    output.trim().to_owned()
}

fn eval_failure(source: &str) -> evaluator::Error {
    match run_with_input(source, "").0 {
        Err(interpreter::Error::Eval(e)) => e,
        other => panic!("expected {} to fail at runtime, got {:?}", source, other),
    }
}

fn read_failure(source: &str) -> reader::Error {
    match run_with_input(source, "").0 {
        Err(interpreter::Error::Read(e)) => e,
        other => panic!("expected {} to fail to read, got {:?}", source, other),
    }
}

#[test]
fn parameters_shadow_globals() {
    assert_eq!(run("(define x 10) (func f (x) (+ x 1)) (f 5)"), Value::Integer(6));
}

#[test]
fn closures_capture_their_scope() {
    assert_eq!(
        run("(define make (lambda (y) (lambda (z) (+ y z)))) (define add5 (make 5)) (add5 2)"),
        Value::Integer(7)
    );
}

#[test]
fn counters_keep_private_state() {
    let source = r#"
        (define make-counter
          (lambda ()
            (define count 0)
            (lambda () (set count (+ count 1)) count)))
        (define a (make-counter))
        (define b (make-counter))
        (a) (a) (b)
        (list (a) (b))
    "#;
    assert_eq!(run_printed(source), "[3, 2]");
}

#[test]
fn recursion() {
    assert_eq!(
        run("(func fact (n) (if (<= n 1) 1 (* n (fact (- n 1))))) (fact 10)"),
        Value::Integer(3628800)
    );
    assert_eq!(
        run("(func fib (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))) (fib 15)"),
        Value::Integer(610)
    );
}

#[test]
fn broadcasting() {
    assert_eq!(run_printed("(+ (list 1 2 3) 1)"), "[2, 3, 4]");
    assert_eq!(
        run("(/ (list 1 2 3) (list 1 2 3))"),
        Value::from(vec![Value::Integer(1), Value::Integer(1), Value::Integer(1)])
    );
    assert_eq!(run_printed("(/ (list 1 2 3) (list 1 2 3))"), "[1.0, 1.0, 1.0]");
    assert_eq!(run_printed("(- (list 5 6 7) (list 1 1))"), "[4, 5]");
    assert_eq!(run_printed("(= (list 1 2 3) 2)"), "[false, true, false]");
    assert_eq!(run_printed("(div (list 7 8 9) 2)"), "[3, 4, 4]");
}

#[test]
fn redefinition_and_assignment() {
    assert!(matches!(
        eval_failure("(define x 1) (define x 2)"),
        evaluator::Error::DuplicateDefinition(_)
    ));
    assert_eq!(run("(define x 1) (set x 2) x"), Value::Integer(2));
}

#[test]
fn set_reaches_outer_scopes() {
    let source = r#"
        (define total 0)
        (func add (n) (set total (+ total n)))
        (add 3) (add 4)
        total
    "#;
    assert_eq!(run(source), Value::Integer(7));
}

#[test]
fn loops() {
    assert_eq!(run("(define s 0) (for i 0 4 (set s (+ s 1))) s"), Value::Integer(4));
    assert_eq!(run("(define s 0) (for i 5 2 (set s (+ s 1))) s"), Value::Integer(0));
    assert_eq!(
        run("(define s 0) (define i 1) (while (<= i 10) (set s (+ s i)) (set i (+ i 1))) s"),
        Value::Integer(55)
    );
}

#[test]
fn unbound_variable() {
    assert!(matches!(eval_failure("zzz"), evaluator::Error::UnboundVariable(_)));
}

#[test]
fn conditionals() {
    assert_eq!(run("(if (> 3 2) \"big\" \"small\")"), Value::from("big"));
    assert!(run("(if false 1)").is_nothing());
    assert_eq!(run("(if (not (empty? (list))) 1 2)"), Value::Integer(2));
    assert_eq!(run("(and (> 3 2) (!= 1 2))"), Value::Bool(true));
}

#[test]
fn list_builtins() {
    assert_eq!(run_printed("(head (list 1 2 3))"), "1");
    assert_eq!(run_printed("(tail (list 1 2 3))"), "[2, 3]");
    assert_eq!(run_printed("(append (list 1) (list 2 3))"), "[1, 2, 3]");
    assert_eq!(run_printed("(reverse (list 1 2 3))"), "[3, 2, 1]");
    assert_eq!(run_printed("(push 0 (list 1 2))"), "[0, 1, 2]");
    assert_eq!(run_printed("(empty? (tail (list 1)))"), "true");
    assert_eq!(run_printed("(length (list 1 \"two\" (list 3)))"), "3");
    assert_eq!(run_printed("(list 1 \"two\" (list 3))"), "[1, \"two\", [3]]");
}

#[test]
fn list_builtins_leave_their_arguments_alone() {
    assert_eq!(
        run_printed("(define xs (list 1 2)) (define ys (push 0 xs)) (append ys (list 9)) xs"),
        "[1, 2]"
    );
}

#[test]
fn index_errors() {
    assert!(matches!(
        eval_failure("(get (list 1 2) 2)"),
        evaluator::Error::BadIndex { index: 2, len: 2, .. }
    ));
    assert!(matches!(
        eval_failure("(get (list 1 2) (- 0 1))"),
        evaluator::Error::BadIndex { .. }
    ));
    assert!(matches!(eval_failure("(get 12 0)"), evaluator::Error::TypeMismatch(_)));
}

#[test]
fn printing() {
    assert_eq!(output_of("(print (+ \"Answer: \" 42))", ""), "Answer: 42");
    assert_eq!(output_of("(print 1 \"two\" (list 3 \"four\"))", ""), "1 two [3, \"four\"]");
    assert_eq!(output_of("(print (/ 7 2) (/ 8 2))", ""), "3.5 4.0");
    assert!(run("(print)").is_nothing());
}

#[test]
fn comments_are_ignored() {
    let source = "$ leading comment\n(define x 1) $ trailing comment\n(+ x 1)";
    assert_eq!(run(source), Value::Integer(2));
}

#[test]
fn last_result_chains() {
    assert_eq!(run("(* 6 7) (+ _ 0)"), Value::Integer(42));
}

#[test]
fn syntax_errors_carry_lines() {
    assert_eq!(
        read_failure("(print 1)\n(print \"oops)").to_string(),
        "[line 2] unterminated string"
    );
    assert_eq!(
        read_failure("(define x 1)\n(define y\n  (+ x 1)").to_string(),
        "[line 2] unterminated list"
    );
    assert!(matches!(read_failure(")"), reader::Error::UnexpectedToken { .. }));
}

#[test]
fn runtime_errors_stop_the_program() {
    let (result, output) = run_with_input("(print 1) (zzz) (print 2)", "");
    assert!(result.is_err());
    assert_eq!(output, "1\n");
}

#[test]
fn deep_recursion_fails_cleanly() {
    let output = SharedBuffer::default();
    let console = Console::new(Cursor::new(String::new()), output.clone());
    let mut interpreter = Interpreter::with_console(console);
    let scope = interpreter.session();
    let result = interpreter.interpret_in(
        "(func down (n) (if (= n 0) 0 (down (- n 1)))) (down 100000)",
        &scope,
    );
    assert!(matches!(
        result,
        Err(interpreter::Error::Eval(evaluator::Error::RecursionLimit(_)))
    ));
    // The session is still usable afterwards.
    assert_eq!(
        interpreter.interpret_in("(down 100)", &scope).unwrap(),
        Value::Integer(0)
    );
}

#[test]
fn deep_nesting_fails_cleanly() {
    let source = format!("{}{}", "(".repeat(100_000), ")".repeat(100_000));
    assert!(matches!(read_failure(&source), reader::Error::TooDeep { .. }));
}

// https://codeforces.com/problemset/problem/1/A
#[test]
fn theatre_square() {
    let source = r#"
        (begin
          (define n 0)
          (define m 0)
          (define a 0)
          (read-int n)
          (read-int m)
          (read-int a)
          (define tiles-n (+ (div (- n 1) a) 1))
          (define tiles-m (+ (div (- m 1) a) 1))
          (print(* tiles-n tiles-m)))
    "#;
    assert_eq!(output_of(source, "6\n6\n4\n"), "4");
    assert_eq!(output_of(source, "6 6 4"), "4");
}

// https://codeforces.com/problemset/problem/4/A
#[test]
fn watermelon() {
    let source = r#"
        (define x 0)
        (read-int x) $ comment after a form
        (print (if (and (> x 2) (= (mod x 2) 0)) "yes" "no"))
    "#;
    assert_eq!(output_of(source, "8"), "yes");
    assert_eq!(output_of(source, "2"), "no");
}

// https://codeforces.com/problemset/problem/231/A
#[test]
fn team() {
    let source = r#"
        (define n 0)
        (read-int n)
        (define count 0)
        (for i 0 n
          (read-ints a b c)
          (if (>= (+ a b c) 2)
              (set count (+ count 1))))
        (print count)
    "#;
    assert_eq!(output_of(source, "3\n1 1 0\n1 1 1\n1 0 0\n"), "2");
}

// https://codeforces.com/problemset/problem/50/A
#[test]
fn domino_piling() {
    let source = r#"
        (read-ints m n)
        (print (div (* m n) 2))
    "#;
    assert_eq!(output_of(source, "2 4"), "4");
    assert_eq!(output_of(source, "3 3"), "4");
}

// https://codeforces.com/problemset/problem/158/A
#[test]
fn next_round() {
    let source = r#"
        (begin
          (define n 0)
          (define k 0)
          (read-int n)
          (read-int k)
          (define scores (list))
          (define i 0)
          (define x 0)
          (while (< i n)
            (read-int x)
            (set scores (append scores (list x)))
            (set i (+ i 1)))
          (define threshold (get scores (- k 1)))
          (define count 0)
          (for j 0 n
            (define sc (get scores j))
            (if (and (>= sc threshold) (> sc 0))
                (set count (+ count 1))
                0))
          (print count))
    "#;
    assert_eq!(output_of(source, "8 5\n10 9 8 7 7 7 5 5\n"), "6");
    assert_eq!(output_of(source, "4 2\n0 0 0 0\n"), "0");
}

// https://codeforces.com/problemset/problem/236/A
#[test]
fn boy_or_girl() {
    let source = r#"
        (read-line username)
        (define count (length (all-unique username)))
        (print (if (= (mod count 2) 0) "CHAT WITH HER!" "IGNORE HIM!"))
    "#;
    assert_eq!(output_of(source, "wjmzbmr"), "CHAT WITH HER!");
    assert_eq!(output_of(source, "xiaodao"), "IGNORE HIM!");
}

// https://codeforces.com/problemset/problem/734/A
#[test]
fn anton_and_danik() {
    let source = r#"
        (define n 0)
        (define s "")
        (read-int n)
        (read-line s)
        (define lst (to-list s))
        (define a-wins 0)
        (define d-wins 0)
        (for i 0 n
          (if (= (get lst i) "A")
              (set a-wins (+ a-wins 1))
              (set d-wins (+ d-wins 1))))
        (if (> a-wins d-wins)
            (print "Anton")
            (if (> d-wins a-wins)
                (print "Danik")
                (print "Friendship")))
    "#;
    assert_eq!(output_of(source, "6\nADAAAA"), "Anton");
    assert_eq!(output_of(source, "7\nDDDAADA"), "Danik");
    assert_eq!(output_of(source, "6\nDADADA"), "Friendship");
}

// https://codeforces.com/problemset/problem/344/A
#[test]
fn magnets() {
    let source = r#"
        (begin
          (define n 0)
          (read-int n)
          (define prev "")
          (define curr "")
          (define groups 0)
          (for i 0 n
            (read-line curr)
            (if (!= curr prev)
                (set groups (+ groups 1))
                0)
            (set prev curr))
          (print groups))
    "#;
    assert_eq!(output_of(source, "6\n10\n10\n10\n01\n10\n10\n"), "3");
    assert_eq!(output_of(source, "4\n01\n01\n10\n10"), "2");
}

// https://codeforces.com/problemset/problem/59/A
#[test]
fn word() {
    let source = r#"
        (begin
          (define s "")
          (read-line s)
          (define chars (to-list s))
          (define lower 0)
          (define upper 0)
          (for i 0 (length chars)
            (if (>= (get-ascii (get chars i)) 97)
                (set lower (+ lower 1))
                (set upper (+ upper 1))))
          (if (> upper lower)
              (print (to-upper s))
              (print (to-lower s))))
    "#;
    assert_eq!(output_of(source, "HoUse"), "house");
    assert_eq!(output_of(source, "ViP"), "VIP");
    assert_eq!(output_of(source, "maTRIx"), "matrix");
}

// https://codeforces.com/problemset/problem/58/A
#[test]
fn chat_room() {
    let source = r#"
        (read-line s)
        (define target "hello")
        (define i 0)
        (define j 0)
        (while (and (< i (length s)) (< j (length target)))
          (if (= (get s i) (get target j))
              (set j (+ j 1)))
          (set i (+ i 1)))
        (print (if (= j (length target)) "YES" "NO"))
    "#;
    assert_eq!(output_of(source, "ahhellllloou"), "YES");
    assert_eq!(output_of(source, "hlelo"), "NO");
}
