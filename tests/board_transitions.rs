use std::sync::Arc;

use mathboard::Board;
use mathboard::errors::Error;
use mathboard::types::VoteType;

#[tokio::test]
async fn accepting_another_solution_moves_the_flag() {
    let board = Board::new();
    let problem = board
        .add_problem("owner", "Limits", "Evaluate $\\lim_{x \\to 0} \\frac{\\sin x}{x}$.")
        .await;
    let a = board.add_solution(problem, "cauchy", "Squeeze theorem.", vec![]).await.unwrap();
    let b = board
        .add_solution(problem, "lhopital", "Differentiate top and bottom.", vec![])
        .await
        .unwrap();

    let other_problem = board.add_problem("someone", "Series", "Sum 1/n^2.").await;
    let other = board
        .add_solution(other_problem, "euler", "Compare with sin x / x.", vec![])
        .await
        .unwrap();
    board.accept_solution(other, "someone").await.unwrap();

    board.accept_solution(a, "owner").await.unwrap();
    board.accept_solution(b, "owner").await.unwrap();

    let accepted: Vec<_> = board
        .solutions_for_problem(problem)
        .await
        .into_iter()
        .filter(|s| s.is_accepted)
        .map(|s| s.id)
        .collect();
    assert_eq!(accepted, vec![b]);
    assert!(board.has_accepted_solution(problem).await);
    assert!(board.solution(other, None).await.unwrap().solution.is_accepted);
}

#[tokio::test]
async fn only_the_problem_author_may_accept() {
    let board = Board::new();
    let problem = board.add_problem("owner", "Primes", "Infinitely many?").await;
    let solution = board
        .add_solution(problem, "euclid", "Multiply them and add one.", vec![])
        .await
        .unwrap();

    let err = board.accept_solution(solution, "euclid").await.unwrap_err();
    match err {
        Error::Forbidden(msg) => assert_eq!(msg, "Only the problem owner can accept solutions"),
        other => panic!("expected forbidden, got {other:?}"),
    }
    assert!(!board.has_accepted_solution(problem).await);
    assert!(matches!(
        board.accept_solution(uuid::Uuid::new_v4(), "owner").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn repeating_a_vote_toggles_it_off() {
    let board = Board::new();
    let problem = board.add_problem("owner", "Series", "Does it converge?").await;
    let solution = board
        .add_solution(problem, "author", "Ratio test.", vec![])
        .await
        .unwrap();
    for voter in ["v1", "v2", "v3", "v4", "v5"] {
        board.vote(solution, voter, VoteType::Up).await.unwrap();
    }
    assert_eq!(board.vote_count(solution).await.unwrap(), 5);

    let first = board.vote(solution, "gauss", VoteType::Up).await.unwrap();
    assert_eq!(first.vote_count, 6);
    assert_eq!(first.current_vote, Some(VoteType::Up));

    let second = board.vote(solution, "gauss", VoteType::Up).await.unwrap();
    assert_eq!(second.vote_count, 5);
    assert_eq!(second.current_vote, None);
}

#[tokio::test]
async fn solutions_are_ordered_accepted_then_votes() {
    let board = Board::new();
    let problem = board.add_problem("owner", "Sums", "Closed form for 1 + ... + n?").await;
    let plain = board.add_solution(problem, "a", "Induction.", vec![]).await.unwrap();
    let popular = board.add_solution(problem, "b", "Pair terms.", vec![]).await.unwrap();
    let accepted = board
        .add_solution(problem, "c", "Telescoping.", vec!["Write k = ...".into()])
        .await
        .unwrap();

    board.vote(popular, "x", VoteType::Up).await.unwrap();
    board.vote(popular, "y", VoteType::Up).await.unwrap();
    board.vote(plain, "x", VoteType::Down).await.unwrap();
    board.accept_solution(accepted, "owner").await.unwrap();

    let order: Vec<_> = board
        .solutions_for_problem(problem)
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(order, vec![accepted, popular, plain]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_are_not_lost() {
    let board = Arc::new(Board::new());
    let problem = board.add_problem("owner", "Graphs", "Color this map.").await;
    let solution = board
        .add_solution(problem, "appel", "Check every case.", vec![])
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..50 {
        let board = Arc::clone(&board);
        handles.push(tokio::spawn(async move {
            board
                .vote(solution, &format!("voter-{i}"), VoteType::Up)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(board.vote_count(solution).await.unwrap(), 50);
}
