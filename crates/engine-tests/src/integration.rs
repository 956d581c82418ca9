#[cfg(test)]
mod tests {
    use crate::{
        pg_client, reset_schema,
        utils::{
            create_orders, execute, export_day, file_count, parse_csv, server_time_zone,
            settings_builder, unpack_archive,
        },
    };
    use connectors::sql::{
        base::{
            error::DbError,
            query::RangeQuery,
            source::{RecordStream, RowSource},
        },
        postgres::source::PgRangeSource,
    };
    use engine_runtime::{
        error::ExportError,
        execution::{executor, stage::ExportStage},
    };
    use model::core::{encoding::TextDecoding, value::Cell, window::ExportWindow};
    use tracing_test::traced_test;

    const ORDERS_HEADER: [&str; 9] = [
        "id",
        "note",
        "amount",
        "rate",
        "ratio",
        "paid",
        "customer_ref",
        "created_at",
        "update_stamp",
    ];

    // Scenario: five orders around 2025-12-07, exported with a small fetch size.
    // Expected Outcome:
    // - Rows stamped at 00:00:00, 10:00:00 and 23:59:59.999999 are exported.
    // - The rows stamped 2025-12-08 00:00:00 and 2025-12-06 23:59:59.999999 are not.
    // - The archive holds one entry named after the CSV, and the CSV is removed.
    // - Values use their default text forms, `real` keeps single precision digits.
    #[traced_test]
    #[tokio::test]
    async fn tc01_day_window_boundaries() {
        let Some(client) = pg_client().await else {
            return;
        };
        let created_at = export_day()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .with_timezone(&server_time_zone(&client).await)
            .fixed_offset();
        let created_at = Cell::TimestampTz(created_at).to_field();
        reset_schema(&client, "export_tc01").await;
        create_orders(&client, "export_tc01").await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_builder("export_tc01", dir.path())
            .fetch_size(2)
            .build()
            .unwrap();

        let report = executor::run(&settings).await.unwrap();

        assert_eq!(report.rows, 3);
        assert!(!report.csv_path.exists());
        assert_eq!(file_count(dir.path()), 1);

        let entries = unpack_archive(&report.archive_path);
        assert_eq!(entries.len(), 1);
        let csv_name = report.csv_path.file_name().unwrap().to_string_lossy();
        assert_eq!(entries[0].0, csv_name);

        let (header, rows) = parse_csv(&entries[0].1);
        assert_eq!(header, ORDERS_HEADER);
        assert_eq!(
            rows,
            vec![
                vec![
                    "1",
                    "first, of the day",
                    "12345.67",
                    "0.5",
                    "1.1",
                    "True",
                    "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11",
                    created_at.as_str(),
                    "2025-12-07 00:00:00",
                ],
                vec![
                    "2",
                    "He said \"hi\"",
                    "10.00",
                    "1.25",
                    "1e+16",
                    "False",
                    "",
                    "",
                    "2025-12-07 10:00:00",
                ],
                vec!["3", "", "", "", "", "", "", "", "2025-12-07 23:59:59.999999"],
            ]
        );
    }

    // Scenario: the table has no rows on the requested day.
    // Expected Outcome: the archive holds a header-only CSV.
    #[traced_test]
    #[tokio::test]
    async fn tc02_empty_day() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc02").await;
        create_orders(&client, "export_tc02").await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_builder("export_tc02", dir.path())
            .day(export_day().succ_opt().unwrap().succ_opt().unwrap())
            .build()
            .unwrap();

        let report = executor::run(&settings).await.unwrap();

        assert_eq!(report.rows, 0);
        let entries = unpack_archive(&report.archive_path);
        let (header, rows) = parse_csv(&entries[0].1);
        assert_eq!(header, ORDERS_HEADER);
        assert!(rows.is_empty());
    }

    // Scenario: text with a non-ASCII character is exported with both decoding policies.
    // Expected Outcome: the session encoding follows the policy, so both reproduce "café".
    #[traced_test]
    #[tokio::test]
    async fn tc03_text_decoding() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc03").await;
        create_orders(&client, "export_tc03").await;
        execute(
            &client,
            "UPDATE export_tc03.orders SET note = 'café' WHERE id = 2",
        )
        .await;

        for (decoding, expected) in [
            (TextDecoding::Utf8, "café"),
            (TextDecoding::Latin1, "café"),
        ] {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings_builder("export_tc03", dir.path())
                .text_decoding(decoding)
                .keep_csv(true)
                .build()
                .unwrap();

            let report = executor::run(&settings).await.unwrap();
            assert!(report.csv_path.exists());

            let csv = std::fs::read(&report.csv_path).unwrap();
            let (_, rows) = parse_csv(&csv);
            assert_eq!(rows[1][1], expected, "decoding {decoding}");
        }
    }

    // Scenario: the table has a column type the exporter cannot render.
    // Expected Outcome: the run fails before the CSV is created.
    #[traced_test]
    #[tokio::test]
    async fn tc04_unsupported_column_type() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc04").await;
        create_orders(&client, "export_tc04").await;
        execute(
            &client,
            "ALTER TABLE export_tc04.orders ADD COLUMN tags integer[]",
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_builder("export_tc04", dir.path()).build().unwrap();

        let err = executor::run(&settings).await.unwrap_err();

        match err {
            ExportError::Database {
                stage: ExportStage::HeaderFetched,
                source: DbError::UnsupportedType { column, .. },
            } => assert_eq!(column, "tags"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(file_count(dir.path()), 0);
    }

    // Scenario: the header is probed without fetching any row.
    // Expected Outcome: column names in table order.
    #[traced_test]
    #[tokio::test]
    async fn tc05_probe_header() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc05").await;
        create_orders(&client, "export_tc05").await;

        let query = RangeQuery::new("export_tc05.orders", "update_stamp");
        let mut source = PgRangeSource::new(client, query, TextDecoding::Latin1);
        let window = ExportWindow::for_day(export_day()).unwrap();

        let header = source.probe_header(&window).await.unwrap();
        assert_eq!(header.columns(), ORDERS_HEADER);

        let mut stream = source.open_stream(&window, 1).await.unwrap();
        assert_eq!(stream.arity(), header.len());
        let mut total = 0;
        while let Some(batch) = stream.next_batch().await.unwrap() {
            assert!(batch.len() <= 1);
            total += batch.len();
        }
        stream.finish().await.unwrap();
        assert_eq!(total, 3);
    }

    // Scenario: the timestamp column does not exist.
    // Expected Outcome: the header probe fails and nothing is written.
    #[traced_test]
    #[tokio::test]
    async fn tc06_missing_timestamp_column() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc06").await;
        create_orders(&client, "export_tc06").await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_builder("export_tc06", dir.path())
            .timestamp_column("changed_at")
            .build()
            .unwrap();

        let err = executor::run(&settings).await.unwrap_err();

        assert_eq!(err.stage(), Some(ExportStage::Connected));
        assert!(matches!(
            err,
            ExportError::Database {
                source: DbError::Postgres(_),
                ..
            }
        ));
        assert_eq!(file_count(dir.path()), 0);
    }

    // Scenario: the session time zone is Asia/Tokyo while rows are streamed.
    // Expected Outcome: timestamptz values are shown in that zone with its offset.
    #[traced_test]
    #[tokio::test]
    async fn tc07_timestamptz_in_session_zone() {
        let Some(client) = pg_client().await else {
            return;
        };
        reset_schema(&client, "export_tc07").await;
        create_orders(&client, "export_tc07").await;
        execute(&client, "SET TimeZone TO 'Asia/Tokyo'").await;

        let query = RangeQuery::new("export_tc07.orders", "update_stamp")
            .with_order_by(Some("id".to_string()));
        let mut source = PgRangeSource::new(client, query, TextDecoding::Utf8);
        let window = ExportWindow::for_day(export_day()).unwrap();
        let header = source.probe_header(&window).await.unwrap();
        let created_at = header.position("created_at").unwrap();

        let mut stream = source.open_stream(&window, 10).await.unwrap();
        let batch = stream.next_batch().await.unwrap().unwrap();
        stream.finish().await.unwrap();

        assert_eq!(
            batch[0].get(created_at).unwrap().to_field(),
            "2025-12-07 09:00:00+09:00"
        );
        assert!(batch[1].get(created_at).unwrap().is_null());
    }
}
