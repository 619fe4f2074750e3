//! Shared containers under concurrent access

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use confwood::*;

#[test]
fn test_concurrent_appends_are_not_lost() {
    let array = Arc::new(Array::new());
    let threads = 8;
    let per_thread = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let array = Arc::clone(&array);
            thread::spawn(move || {
                for i in 0..per_thread {
                    array.add(Value::from(t * per_thread + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(array.len(), threads * per_thread);
    let mut seen: Vec<_> = array
        .to_vec()
        .iter()
        .map(|v| v.as_number().unwrap() as usize)
        .collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), threads * per_thread);
}

#[test]
fn test_concurrent_dictionary_writers() {
    let dict = Arc::new(Dictionary::new());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let dict = Arc::clone(&dict);
            thread::spawn(move || {
                for i in 0..250 {
                    dict.set(format!("k{t}_{i}"), Value::from(i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(dict.len(), 1000);
}

#[test]
fn test_container_calls_while_holding_the_lock() {
    let array = Array::new();
    let lock = ObjectLock::new(&array);

    // every container operation takes the lock again on this thread
    array.add(Value::from(1)).unwrap();
    array.add(Value::from(2)).unwrap();
    let sum: f64 = array
        .iter(&lock)
        .map(|(_, v)| v.as_number().unwrap_or_default())
        .sum();
    assert_eq!(sum, 3.0);
    assert_eq!(array.len(), 2);
}

#[test]
fn test_lock_excludes_other_threads() {
    let array = Arc::new(Array::new());
    let lock = ObjectLock::new(array.as_ref());

    let writer = {
        let array = Arc::clone(&array);
        thread::spawn(move || array.add(Value::from("late")).unwrap())
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(array.len(), 0);

    drop(lock);
    writer.join().unwrap();
    assert_eq!(array.len(), 1);
}

#[test]
fn test_shared_context_across_threads() {
    let ctx = Arc::new(EvalContext::new());
    let counter = Arc::new(Array::new());
    ctx.globals()
        .set("hits", Value::Array(Arc::clone(&counter)))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let mut frame = ScriptFrame::new(&ctx);
                for _ in 0..100 {
                    Expr::method_call(Expr::variable("hits"), "add", vec![Expr::literal(1)])
                        .evaluate(&mut frame)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counter.len(), 400);
}
