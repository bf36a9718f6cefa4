#[cfg(test)]
mod tests {
    use burrow_core::{
        Condition, Consistency, Converter, Cursor, CursorState, Error, Executor, Filter,
        FilterBuilder, Native, NativeMap, OperatorSet, PagingMode, PagingState, Query, Result,
        ResultSet, Session, Statement, StoreError, Value,
    };
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tokio::sync::oneshot;

    enum Script {
        Page {
            rows: Vec<i32>,
            token: Option<&'static [u8]>,
            exhausted: bool,
        },
        Fail,
    }

    struct SpyRows {
        rows: VecDeque<NativeMap>,
        token: Option<PagingState>,
        exhausted: bool,
    }

    impl ResultSet for SpyRows {
        fn next_row(&mut self) -> Option<NativeMap> {
            self.rows.pop_front()
        }
        fn available_without_fetching(&self) -> usize {
            self.rows.len()
        }
        fn is_exhausted(&self) -> bool {
            self.exhausted
        }
        fn paging_state(&self) -> Option<PagingState> {
            self.token.clone()
        }
    }

    /// Session replaying a script, one entry per native call.
    struct Spy {
        builder: FilterBuilder,
        script: Mutex<VecDeque<Script>>,
        calls: AtomicUsize,
        tokens: Mutex<Vec<Option<Vec<u8>>>>,
        consistencies: Mutex<Vec<Option<Consistency>>>,
    }

    impl Spy {
        fn new(script: impl IntoIterator<Item = Script>) -> Arc<Self> {
            Arc::new(Self {
                builder: FilterBuilder::new("spy", Arc::new(Converter::default()))
                    .with_supported(OperatorSet::KEY_LOOKUP),
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicUsize::new(0),
                tokens: Mutex::new(Vec::new()),
                consistencies: Mutex::new(Vec::new()),
            })
        }
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Session for Spy {
        type Builder = FilterBuilder;
        type Rows = SpyRows;

        fn builder(&self) -> &FilterBuilder {
            &self.builder
        }

        async fn execute(&self, statement: Statement<Filter>) -> Result<SpyRows> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .lock()
                .unwrap()
                .push(statement.paging_state.map(|v| v.as_bytes().to_vec()));
            self.consistencies
                .lock()
                .unwrap()
                .push(statement.consistency);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Script::Page {
                    rows,
                    token,
                    exhausted,
                }) => Ok(SpyRows {
                    rows: rows
                        .into_iter()
                        .map(|n| {
                            NativeMap::from_iter([("n".to_string(), Native::Scalar(n.into()))])
                        })
                        .collect(),
                    token: token.map(PagingState::from_bytes),
                    exhausted,
                }),
                Some(Script::Fail) => Err(Error::msg("connection reset by peer")),
                None => Err(Error::msg("no more scripted responses")),
            }
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn numbers(entities: &[burrow_core::Entity]) -> Vec<i32> {
        entities
            .iter()
            .map(|v| v.find("n").unwrap().get::<i32>().unwrap())
            .collect()
    }

    fn two_pages() -> [Script; 2] {
        [
            Script::Page {
                rows: vec![1, 2, 3],
                token: Some(b"page-2"),
                exhausted: false,
            },
            Script::Page {
                rows: vec![4, 5],
                token: None,
                exhausted: true,
            },
        ]
    }

    #[tokio::test]
    async fn pagination_continuation() {
        let spy = Spy::new(two_pages());
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers").fetch_size(3);

        let cursor = Cursor::new();
        assert_eq!(cursor.state(), CursorState::Fresh);
        let page = executor.select(&query, &cursor).await.unwrap();
        assert_eq!(numbers(&page.entities), [1, 2, 3]);
        assert_eq!(page.cursor.state(), CursorState::InProgress);

        let page = executor.select(&query, &page.cursor).await.unwrap();
        assert_eq!(numbers(&page.entities), [4, 5]);
        assert_eq!(page.cursor.state(), CursorState::Exhausted);

        let last = executor.select(&query, &page.cursor).await.unwrap();
        assert!(last.is_empty());
        assert!(last.cursor.is_exhausted());
        assert_eq!(spy.calls(), 2);
        assert_eq!(
            *spy.tokens.lock().unwrap(),
            [None, Some(b"page-2".to_vec())]
        );
    }

    #[tokio::test]
    async fn consistency_reaches_the_statement() {
        let spy = Spy::new(two_pages().into_iter().chain(two_pages()));
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers").consistency(Consistency::Quorum);
        let page = executor.select(&query, &Cursor::new()).await.unwrap();
        executor.select(&query, &page.cursor).await.unwrap();
        executor
            .select(&Query::select("numbers"), &Cursor::new())
            .await
            .unwrap();
        assert_eq!(
            *spy.consistencies.lock().unwrap(),
            [Some(Consistency::Quorum), Some(Consistency::Quorum), None]
        );
    }

    #[tokio::test]
    async fn exhausted_cursor_never_calls_the_session() {
        let spy = Spy::new([]);
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers");
        for _ in 0..3 {
            let page = executor.select(&query, &Cursor::exhausted()).await.unwrap();
            assert!(page.is_empty());
        }
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_the_cursor() {
        let spy = Spy::new([
            Script::Page {
                rows: vec![1],
                token: Some(b"p2"),
                exhausted: false,
            },
            Script::Fail,
            Script::Page {
                rows: vec![2],
                token: None,
                exhausted: true,
            },
        ]);
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers");
        let page = executor.select(&query, &Cursor::new()).await.unwrap();
        let cursor = page.cursor;

        let error = executor.select(&query, &cursor).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::Execution { .. })
        ));
        assert!(format!("{:#}", error).contains("connection reset by peer"));
        assert_eq!(cursor.state(), CursorState::InProgress);

        let page = executor.select(&query, &cursor).await.unwrap();
        assert_eq!(numbers(&page.entities), [2]);
        assert_eq!(
            *spy.tokens.lock().unwrap(),
            [None, Some(b"p2".to_vec()), Some(b"p2".to_vec())]
        );
    }

    #[tokio::test]
    async fn unsupported_condition_is_rejected_before_any_call() {
        let spy = Spy::new(two_pages());
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers")
            .filter(Condition::or([Condition::eq("n", 1), Condition::eq("n", 2)]));
        let error = executor.select(&query, &Cursor::new()).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::UnsupportedCondition { .. })
        ));
        let query = Query::select("numbers").filter(Condition::like("n", "1%"));
        assert!(executor.select(&query, &Cursor::new()).await.is_err());
        let query = Query::select("numbers").filter(Condition::r#in("n", 1));
        let error = executor.select(&query, &Cursor::new()).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::InvalidConditionShape { .. })
        ));
        let error = executor
            .select(&Query::select(""), &Cursor::new())
            .await
            .unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::MissingCollection)
        ));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn default_mode_drains_every_page() {
        let spy = Spy::new(two_pages());
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()))
            .with_mode(PagingMode::Default);
        let page = executor
            .select(&Query::select("numbers"), &Cursor::new())
            .await
            .unwrap();
        assert_eq!(numbers(&page.entities), [1, 2, 3, 4, 5]);
        assert!(page.cursor.is_exhausted());
        assert_eq!(spy.calls(), 2);
    }

    #[tokio::test]
    async fn empty_page_takes_the_flag_of_the_result() {
        let spy = Spy::new([
            Script::Page {
                rows: vec![],
                token: Some(b"later"),
                exhausted: false,
            },
            Script::Page {
                rows: vec![],
                token: None,
                exhausted: true,
            },
        ]);
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers");
        let page = executor.select(&query, &Cursor::new()).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.cursor.state(), CursorState::InProgress);
        let page = executor.select(&query, &page.cursor).await.unwrap();
        assert!(page.is_empty());
        assert!(page.cursor.is_exhausted());
    }

    #[tokio::test]
    async fn select_all_and_async() {
        let spy = Spy::new(two_pages().into_iter().chain(two_pages()));
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers").filter(Condition::r#in("n", vec![1, 2, 3, 4, 5]));
        let all = executor.select_all(&query).await.unwrap();
        assert_eq!(numbers(&all), [1, 2, 3, 4, 5]);

        let (tx, rx) = oneshot::channel();
        executor
            .select_async(query, Cursor::new(), move |result| {
                let _ = tx.send(result);
            })
            .await
            .unwrap();
        let page = rx.await.unwrap().unwrap();
        assert_eq!(numbers(&page.entities), [1, 2, 3]);
        assert_eq!(spy.calls(), 3);
    }

    #[tokio::test]
    async fn independent_cursors_do_not_interfere() {
        let spy = Spy::new([
            Script::Page {
                rows: vec![1],
                token: Some(b"a"),
                exhausted: false,
            },
            Script::Page {
                rows: vec![10],
                token: Some(b"b"),
                exhausted: false,
            },
        ]);
        let executor = Executor::new(spy.clone(), Arc::new(Converter::default()));
        let query = Query::select("numbers");
        let first = executor.select(&query, &Cursor::new()).await.unwrap();
        let second = executor.select(&query, &Cursor::new()).await.unwrap();
        assert_eq!(
            first.cursor.paging_state().map(|v| v.as_bytes()),
            Some(&b"a"[..])
        );
        assert_eq!(
            second.cursor.paging_state().map(|v| v.as_bytes()),
            Some(&b"b"[..])
        );
        assert_eq!(first.entities[0].find("n").unwrap().value, Value::Int32(Some(1)));
    }
}
