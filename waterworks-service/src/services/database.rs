//! Database service for waterworks-service.

use crate::models::{
    Announcement, Barangay, Bill, CreateAnnouncement, CreateCustomer, CreditAdjustment, Customer,
    CustomerSort, DiscountOption, ListBillsFilter, ListCustomersFilter, Message, NewBill,
    NewMessage, RateEntry, SettlementWrite, UpdateAnnouncement, UpdateBill, UpdateCustomer, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};

const BILL_COLUMNS: &str = "billid, customerid, customername, billedmonth, previousreading, \
    currentreading, consumption, basicamount, surchargeamount, discountamount, totalbillamount, \
    advancepaymentamount, paymentstatus, encodedby, paidby, dateencoded, datepaid";

const CUSTOMER_COLUMNS: &str =
    "customerid, name, type, barangay, discount, credit_balance, remarks, date_added";

/// Generated identifiers collide rarely at municipal scale; give up after a
/// handful of attempts rather than looping forever.
const ID_GENERATION_ATTEMPTS: u32 = 5;

fn random_customer_id() -> i32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

fn random_bill_id() -> i32 {
    rand::thread_rng().gen_range(10_000_000..=99_999_999)
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "waterworks-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Create a new customer with a generated 6-digit account number.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        for attempt in 1..=ID_GENERATION_ATTEMPTS {
            let customerid = random_customer_id();
            let result = sqlx::query_as::<_, Customer>(&format!(
                r#"
                INSERT INTO customers (customerid, name, type, barangay, discount, remarks)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {CUSTOMER_COLUMNS}
                "#
            ))
            .bind(customerid)
            .bind(&input.name)
            .bind(&input.r#type)
            .bind(&input.barangay)
            .bind(input.discount)
            .bind(&input.remarks)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(customer) => {
                    timer.observe_duration();
                    info!(customerid = customer.customerid, "Customer created");
                    return Ok(customer);
                }
                Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                    warn!(attempt, customerid, "Generated customer id collided, retrying");
                    continue;
                }
                Err(e) => {
                    return Err(AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to create customer: {}",
                        e
                    )));
                }
            }
        }

        Err(AppError::DatabaseError(anyhow::anyhow!(
            "Could not allocate a unique customer id after {} attempts",
            ID_GENERATION_ATTEMPTS
        )))
    }

    /// Get a customer by account number.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, customerid: i32) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customerid = $1"
        ))
        .bind(customerid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List customers with optional filters, returning the page and the
    /// unpaged total. The search term matches the name (case-insensitive
    /// substring) or an account-number prefix.
    #[instrument(skip(self, filter))]
    pub async fn list_customers(
        &self,
        filter: &ListCustomersFilter,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let order_by = match filter.sort {
            CustomerSort::DateAddedDesc => "date_added DESC",
            CustomerSort::NameAsc => "lower(name) ASC",
            CustomerSort::NameDesc => "lower(name) DESC",
        };
        let limit = filter.limit.clamp(1, 100);

        const FILTER_CLAUSE: &str = r#"
            ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR customerid::text LIKE $1 || '%')
            AND ($2::text IS NULL OR barangay = $2)
            AND ($3::text IS NULL OR type = $3)
        "#;

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE {FILTER_CLAUSE}
            ORDER BY {order_by}
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(&filter.search)
        .bind(&filter.barangay)
        .bind(&filter.r#type)
        .bind(limit)
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM customers WHERE {FILTER_CLAUSE}"
        ))
        .bind(&filter.search)
        .bind(&filter.barangay)
        .bind(&filter.r#type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
        })?;

        timer.observe_duration();

        Ok((customers, total))
    }

    /// Update a customer's editable fields; `None` leaves a field untouched.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customerid: i32,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                type = COALESCE($3, type),
                barangay = COALESCE($4, barangay),
                discount = COALESCE($5, discount),
                remarks = COALESCE($6, remarks)
            WHERE customerid = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customerid)
        .bind(&input.name)
        .bind(&input.r#type)
        .bind(&input.barangay)
        .bind(input.discount)
        .bind(&input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e))
        })?;

        timer.observe_duration();

        if customer.is_some() {
            info!(customerid, "Customer updated");
        }

        Ok(customer)
    }

    /// Delete a customer. Fails with a conflict when bills reference the
    /// account, so billing history is never orphaned.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customerid: i32) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query("DELETE FROM customers WHERE customerid = $1")
            .bind(customerid)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Customer {} has bills on record; delete those first",
                        customerid
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e)),
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(customerid, "Customer deleted");
        }

        Ok(deleted)
    }

    /// List customers holding a positive credit balance, optionally filtered
    /// by the same name/account search as [`list_customers`].
    ///
    /// [`list_customers`]: Database::list_customers
    #[instrument(skip(self))]
    pub async fn list_customers_with_credit(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers_with_credit"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE credit_balance > 0
              AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR customerid::text LIKE $1 || '%')
            ORDER BY lower(name) ASC
            "#
        ))
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list credit balances: {}", e))
        })?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Add to or overwrite a customer's credit balance.
    #[instrument(skip(self))]
    pub async fn adjust_credit(
        &self,
        customerid: i32,
        mode: CreditAdjustment,
        amount: Decimal,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["adjust_credit"])
            .start_timer();

        let query = match mode {
            CreditAdjustment::Add => format!(
                r#"
                UPDATE customers SET credit_balance = credit_balance + $2
                WHERE customerid = $1
                RETURNING {CUSTOMER_COLUMNS}
                "#
            ),
            CreditAdjustment::Set => format!(
                r#"
                UPDATE customers SET credit_balance = $2
                WHERE customerid = $1
                RETURNING {CUSTOMER_COLUMNS}
                "#
            ),
        };

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(customerid)
            .bind(amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to adjust credit: {}", e))
            })?;

        timer.observe_duration();

        if let Some(ref c) = customer {
            info!(customerid, new_balance = %c.credit_balance, "Credit balance adjusted");
        }

        Ok(customer)
    }

    // -------------------------------------------------------------------------
    // Bill Operations
    // -------------------------------------------------------------------------

    /// Check whether the customer already has a bill for the given month.
    #[instrument(skip(self))]
    pub async fn bill_exists_for_month(
        &self,
        customerid: i32,
        billedmonth: NaiveDate,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["bill_exists_for_month"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bills WHERE customerid = $1 AND billedmonth = $2)",
        )
        .bind(customerid)
        .bind(billedmonth)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check for existing bill: {}", e))
        })?;

        timer.observe_duration();

        Ok(exists)
    }

    /// Insert a fully-derived bill with a generated 8-digit bill number.
    /// A second bill for the same customer and month is rejected as a
    /// conflict; the unique constraint backs the handler's pre-check.
    #[instrument(skip(self, input), fields(customerid = input.customerid, billedmonth = %input.billedmonth))]
    pub async fn create_bill(&self, input: &NewBill) -> Result<Bill, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_bill"])
            .start_timer();

        for attempt in 1..=ID_GENERATION_ATTEMPTS {
            let billid = random_bill_id();
            let result = sqlx::query_as::<_, Bill>(&format!(
                r#"
                INSERT INTO bills (billid, customerid, customername, billedmonth, previousreading,
                    currentreading, consumption, basicamount, surchargeamount, totalbillamount,
                    paymentstatus, encodedby, dateencoded)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING {BILL_COLUMNS}
                "#
            ))
            .bind(billid)
            .bind(input.customerid)
            .bind(&input.customername)
            .bind(input.billedmonth)
            .bind(input.previousreading)
            .bind(input.currentreading)
            .bind(input.consumption)
            .bind(input.basicamount)
            .bind(input.surchargeamount)
            .bind(input.totalbillamount)
            .bind("Unpaid")
            .bind(&input.encodedby)
            .bind(input.dateencoded)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(bill) => {
                    timer.observe_duration();
                    info!(billid = bill.billid, "Bill created");
                    return Ok(bill);
                }
                Err(sqlx::Error::Database(ref db_err))
                    if db_err.constraint() == Some("bills_customer_month_key") =>
                {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "A bill for {} and month {} already exists",
                        input.customername,
                        input.billedmonth.format("%Y-%m")
                    )));
                }
                Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                    warn!(attempt, billid, "Generated bill id collided, retrying");
                    continue;
                }
                Err(e) => {
                    return Err(AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to create bill: {}",
                        e
                    )));
                }
            }
        }

        Err(AppError::DatabaseError(anyhow::anyhow!(
            "Could not allocate a unique bill id after {} attempts",
            ID_GENERATION_ATTEMPTS
        )))
    }

    /// Get a bill by number.
    #[instrument(skip(self))]
    pub async fn get_bill(&self, billid: i32) -> Result<Option<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_bill"])
            .start_timer();

        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE billid = $1"
        ))
        .bind(billid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get bill: {}", e)))?;

        timer.observe_duration();

        Ok(bill)
    }

    /// List bills with optional filters, newest encoding first, returning
    /// the page and the unpaged total.
    #[instrument(skip(self, filter))]
    pub async fn list_bills(
        &self,
        filter: &ListBillsFilter,
    ) -> Result<(Vec<Bill>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_bills"])
            .start_timer();

        let limit = filter.limit.clamp(1, 100);
        let status = filter.status.map(|s| s.as_str());

        const FILTER_CLAUSE: &str = r#"
            ($1::text IS NULL OR customername ILIKE '%' || $1 || '%')
            AND ($2::int4 IS NULL OR customerid = $2)
            AND ($3::date IS NULL OR billedmonth = $3)
            AND ($4::text IS NULL OR paymentstatus = $4)
        "#;

        let bills = sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE {FILTER_CLAUSE}
            ORDER BY dateencoded DESC, billid DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(&filter.search)
        .bind(filter.customerid)
        .bind(filter.billedmonth)
        .bind(status)
        .bind(limit)
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list bills: {}", e)))?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bills WHERE {FILTER_CLAUSE}"))
                .bind(&filter.search)
                .bind(filter.customerid)
                .bind(filter.billedmonth)
                .bind(status)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count bills: {}", e))
                })?;

        timer.observe_duration();

        Ok((bills, total))
    }

    /// Full statement for one customer, most recent billed month first.
    #[instrument(skip(self))]
    pub async fn list_customer_bills(&self, customerid: i32) -> Result<Vec<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customer_bills"])
            .start_timer();

        let bills = sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE customerid = $1
            ORDER BY billedmonth DESC
            "#
        ))
        .bind(customerid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list customer bills: {}", e))
        })?;

        timer.observe_duration();

        Ok(bills)
    }

    /// Bills still owed by a customer: anything not yet marked Paid,
    /// including partially paid and overdue ones.
    #[instrument(skip(self))]
    pub async fn list_unpaid_bills(&self, customerid: i32) -> Result<Vec<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_unpaid_bills"])
            .start_timer();

        let bills = sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE customerid = $1 AND paymentstatus <> 'Paid'
            ORDER BY billedmonth DESC
            "#
        ))
        .bind(customerid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list unpaid bills: {}", e))
        })?;

        timer.observe_duration();

        Ok(bills)
    }

    /// The customer's most recent bill by billed month, if any. Used to
    /// prefill the next encoding.
    #[instrument(skip(self))]
    pub async fn latest_bill(&self, customerid: i32) -> Result<Option<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["latest_bill"])
            .start_timer();

        let bill = sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE customerid = $1
            ORDER BY billedmonth DESC
            LIMIT 1
            "#
        ))
        .bind(customerid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get latest bill: {}", e)))?;

        timer.observe_duration();

        Ok(bill)
    }

    /// Update a bill's editable fields; `None` leaves the column untouched.
    /// Moving a bill onto a month that already has one is a conflict.
    #[instrument(skip(self, input))]
    pub async fn update_bill(
        &self,
        billid: i32,
        input: &UpdateBill,
    ) -> Result<Option<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_bill"])
            .start_timer();

        let status = input.paymentstatus.map(|s| s.as_str());

        let bill = sqlx::query_as::<_, Bill>(&format!(
            r#"
            UPDATE bills
            SET billedmonth = COALESCE($2, billedmonth),
                previousreading = COALESCE($3, previousreading),
                currentreading = COALESCE($4, currentreading),
                consumption = COALESCE($5, consumption),
                basicamount = COALESCE($6, basicamount),
                surchargeamount = COALESCE($7, surchargeamount),
                discountamount = COALESCE($8, discountamount),
                totalbillamount = COALESCE($9, totalbillamount),
                paymentstatus = COALESCE($10, paymentstatus),
                encodedby = COALESCE($11, encodedby)
            WHERE billid = $1
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(billid)
        .bind(input.billedmonth)
        .bind(input.previousreading)
        .bind(input.currentreading)
        .bind(input.consumption)
        .bind(input.basicamount)
        .bind(input.surchargeamount)
        .bind(input.discountamount)
        .bind(input.totalbillamount)
        .bind(status)
        .bind(&input.encodedby)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("bills_customer_month_key") =>
            {
                AppError::Conflict(anyhow::anyhow!(
                    "A bill for that customer and month already exists"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update bill: {}", e)),
        })?;

        timer.observe_duration();

        if bill.is_some() {
            info!(billid, "Bill updated");
        }

        Ok(bill)
    }

    /// Delete a bill by number.
    #[instrument(skip(self))]
    pub async fn delete_bill(&self, billid: i32) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_bill"])
            .start_timer();

        let result = sqlx::query("DELETE FROM bills WHERE billid = $1")
            .bind(billid)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete bill: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(billid, "Bill deleted");
        }

        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Apply a computed settlement in one transaction: every selected bill is
    /// marked Paid with its final amounts, and the customer's credit balance
    /// is replaced. Either all writes land or none do.
    #[instrument(skip(self, writes), fields(bill_count = writes.len()))]
    pub async fn apply_settlement(
        &self,
        customerid: i32,
        writes: &[SettlementWrite],
        new_credit_balance: Decimal,
        paidby: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Vec<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_settlement"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut settled = Vec::with_capacity(writes.len());
        for write in writes {
            let bill = sqlx::query_as::<_, Bill>(&format!(
                r#"
                UPDATE bills
                SET surchargeamount = $3,
                    discountamount = $4,
                    totalbillamount = $5,
                    advancepaymentamount = $6,
                    paymentstatus = 'Paid',
                    paidby = $7,
                    datepaid = $8
                WHERE billid = $1 AND customerid = $2
                RETURNING {BILL_COLUMNS}
                "#
            ))
            .bind(write.billid)
            .bind(customerid)
            .bind(write.surchargeamount)
            .bind(write.discountamount)
            .bind(write.totalbillamount)
            .bind(write.advancepaymentamount)
            .bind(paidby)
            .bind(paid_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to settle bill: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Bill {} not found for customer {}",
                    write.billid,
                    customerid
                ))
            })?;
            settled.push(bill);
        }

        let updated = sqlx::query("UPDATE customers SET credit_balance = $2 WHERE customerid = $1")
            .bind(customerid)
            .bind(new_credit_balance)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update credit balance: {}", e))
            })?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                customerid
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            customerid,
            bill_count = settled.len(),
            new_credit_balance = %new_credit_balance,
            "Settlement applied"
        );

        Ok(settled)
    }

    // -------------------------------------------------------------------------
    // Tariff and Lookup Operations
    // -------------------------------------------------------------------------

    /// List the tariff table (rate tiers per customer type).
    #[instrument(skip(self))]
    pub async fn list_rates(&self) -> Result<Vec<RateEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_rates"])
            .start_timer();

        let rates = sqlx::query_as::<_, RateEntry>(
            "SELECT type, rate1, rate2 FROM customer_type ORDER BY type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list rates: {}", e)))?;

        timer.observe_duration();

        Ok(rates)
    }

    /// Rate tiers for a single customer type.
    #[instrument(skip(self))]
    pub async fn get_rate(&self, customer_type: &str) -> Result<Option<RateEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rate"])
            .start_timer();

        let rate = sqlx::query_as::<_, RateEntry>(
            "SELECT type, rate1, rate2 FROM customer_type WHERE type = $1",
        )
        .bind(customer_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get rate: {}", e)))?;

        timer.observe_duration();

        Ok(rate)
    }

    /// List the discount options offered to customers.
    #[instrument(skip(self))]
    pub async fn list_discounts(&self) -> Result<Vec<DiscountOption>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_discounts"])
            .start_timer();

        let discounts = sqlx::query_as::<_, DiscountOption>(
            "SELECT id, type, discountpercentage FROM discount ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list discounts: {}", e)))?;

        timer.observe_duration();

        Ok(discounts)
    }

    /// List the barangays served by the utility.
    #[instrument(skip(self))]
    pub async fn list_barangays(&self) -> Result<Vec<Barangay>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_barangays"])
            .start_timer();

        let barangays =
            sqlx::query_as::<_, Barangay>("SELECT barangay FROM barangays ORDER BY barangay")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to list barangays: {}", e))
                })?;

        timer.observe_duration();

        Ok(barangays)
    }

    // -------------------------------------------------------------------------
    // Announcement Operations
    // -------------------------------------------------------------------------

    /// Post a new announcement.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_announcement(
        &self,
        input: &CreateAnnouncement,
    ) -> Result<Announcement, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_announcement"])
            .start_timer();

        let announcement = sqlx::query_as::<_, Announcement>(
            r#"
            INSERT INTO announcement (title, description, status, posted_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, status, date_posted, posted_by
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.as_str())
        .bind(&input.posted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create announcement: {}", e))
        })?;

        timer.observe_duration();

        info!(id = announcement.id, "Announcement created");

        Ok(announcement)
    }

    /// List announcements, newest first, optionally restricted to one status.
    #[instrument(skip(self))]
    pub async fn list_announcements(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<Announcement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_announcements"])
            .start_timer();

        let announcements = sqlx::query_as::<_, Announcement>(
            r#"
            SELECT id, title, description, status, date_posted, posted_by
            FROM announcement
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY date_posted DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list announcements: {}", e))
        })?;

        timer.observe_duration();

        Ok(announcements)
    }

    /// Update an announcement's title, body, or status.
    #[instrument(skip(self, input))]
    pub async fn update_announcement(
        &self,
        id: i64,
        input: &UpdateAnnouncement,
    ) -> Result<Option<Announcement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_announcement"])
            .start_timer();

        let status = input.status.map(|s| s.as_str());

        let announcement = sqlx::query_as::<_, Announcement>(
            r#"
            UPDATE announcement
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status)
            WHERE id = $1
            RETURNING id, title, description, status, date_posted, posted_by
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update announcement: {}", e))
        })?;

        timer.observe_duration();

        if announcement.is_some() {
            info!(id, "Announcement updated");
        }

        Ok(announcement)
    }

    /// Delete an announcement.
    #[instrument(skip(self))]
    pub async fn delete_announcement(&self, id: i64) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_announcement"])
            .start_timer();

        let result = sqlx::query("DELETE FROM announcement WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete announcement: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Message Operations
    // -------------------------------------------------------------------------

    /// Record a message sent to a staff inbox.
    #[instrument(skip(self, input), fields(recipient = %input.recipient_email))]
    pub async fn create_message(&self, input: &NewMessage) -> Result<Message, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_message"])
            .start_timer();

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_name, sender_barangay, message, recipient_email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_name, sender_barangay, message, recipient_email, sent_at
            "#,
        )
        .bind(&input.sender_name)
        .bind(&input.sender_barangay)
        .bind(&input.message)
        .bind(&input.recipient_email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create message: {}", e)))?;

        timer.observe_duration();

        info!(id = message.id, "Message recorded");

        Ok(message)
    }

    /// Inbox for one recipient, newest first.
    #[instrument(skip(self))]
    pub async fn list_messages(&self, recipient_email: &str) -> Result<Vec<Message>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_messages"])
            .start_timer();

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_name, sender_barangay, message, recipient_email, sent_at
            FROM messages
            WHERE recipient_email = $1
            ORDER BY sent_at DESC
            "#,
        )
        .bind(recipient_email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list messages: {}", e)))?;

        timer.observe_duration();

        Ok(messages)
    }

    /// Delete a message, but only from the given recipient's inbox.
    #[instrument(skip(self))]
    pub async fn delete_message(&self, id: i64, recipient_email: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_message"])
            .start_timer();

        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND recipient_email = $2")
            .bind(id)
            .bind(recipient_email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete message: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// Look up a staff user by email.
    #[instrument(skip(self))]
    pub async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            "SELECT email, firstname, lastname, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }
}
