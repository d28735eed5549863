//! Product catalog
//!
//! Read/write store of products keyed by id and by unique display name.
//! The catalog is the exclusive owner of stock mutation: the sync engine
//! resolves remote line entries through it, and the order services deduct
//! stock through it inside their own write transactions.

use redb::WriteTransaction;
use tracing::info;

use crate::store::{LocalStore, Product, ProductCreate, ProductId, ProductUpdate};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ProductCatalog {
    store: LocalStore,
}

impl ProductCatalog {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Create a product with a unique display name
    pub fn create(&self, req: ProductCreate) -> AppResult<Product> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("Product name must not be empty".into()));
        }
        let stock = req.stock.unwrap_or(0);
        if stock < 0 {
            return Err(AppError::Validation("Stock must not be negative".into()));
        }

        let txn = self.store.begin_write()?;
        if self
            .store
            .find_product_by_name_txn(&txn, &req.name)?
            .is_some()
        {
            return Err(AppError::Validation(format!(
                "Product name already exists: {}",
                req.name
            )));
        }

        let product = Product {
            id: self.store.next_counter(&txn, "product")?,
            name: req.name,
            price: req.price,
            description: req.description,
            image_url: req.image_url,
            stock,
            unit: req.unit,
            is_active: true,
        };
        self.store.put_product(&txn, &product)?;
        txn.commit().map_err(crate::store::StoreError::from)?;

        info!(product_id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Update product fields (stock excluded, see [`set_stock`](Self::set_stock))
    pub fn update(&self, product_id: ProductId, req: ProductUpdate) -> AppResult<Product> {
        let txn = self.store.begin_write()?;
        let mut product = self
            .store
            .get_product_txn(&txn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;

        if let Some(name) = req.name
            && name != product.name
        {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Product name must not be empty".into()));
            }
            if self.store.find_product_by_name_txn(&txn, &name)?.is_some() {
                return Err(AppError::Validation(format!(
                    "Product name already exists: {name}"
                )));
            }
            self.store.remove_product_name(&txn, &product.name)?;
            product.name = name;
        }
        if let Some(price) = req.price {
            product.price = price;
        }
        if let Some(description) = req.description {
            product.description = Some(description);
        }
        if let Some(image_url) = req.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(unit) = req.unit {
            product.unit = Some(unit);
        }
        if let Some(is_active) = req.is_active {
            product.is_active = is_active;
        }

        self.store.put_product(&txn, &product)?;
        txn.commit().map_err(crate::store::StoreError::from)?;
        Ok(product)
    }

    /// Delete a product
    pub fn delete(&self, product_id: ProductId) -> AppResult<()> {
        let txn = self.store.begin_write()?;
        let product = self
            .store
            .get_product_txn(&txn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;
        self.store.delete_product(&txn, &product)?;
        txn.commit().map_err(crate::store::StoreError::from)?;
        info!(product_id, "Product deleted");
        Ok(())
    }

    /// Get a product by id
    pub fn get(&self, product_id: ProductId) -> AppResult<Product> {
        self.store
            .get_product(product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))
    }

    /// Look up a product by exact display name
    pub fn find_by_name(&self, name: &str) -> AppResult<Option<Product>> {
        Ok(self.store.find_product_by_name(name)?)
    }

    /// Look up a product by exact display name within an open transaction
    pub fn find_by_name_txn(
        &self,
        txn: &WriteTransaction,
        name: &str,
    ) -> AppResult<Option<Product>> {
        Ok(self.store.find_product_by_name_txn(txn, name)?)
    }

    /// Get all products
    pub fn list(&self) -> AppResult<Vec<Product>> {
        Ok(self.store.list_products()?)
    }

    /// Replace the stock quantity of a product
    pub fn set_stock(&self, product_id: ProductId, stock: i64) -> AppResult<Product> {
        if stock < 0 {
            return Err(AppError::Validation("Stock must not be negative".into()));
        }
        let txn = self.store.begin_write()?;
        let mut product = self
            .store
            .get_product_txn(&txn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;
        product.stock = stock;
        self.store.put_product(&txn, &product)?;
        txn.commit().map_err(crate::store::StoreError::from)?;
        Ok(product)
    }

    /// Deduct stock within the caller's transaction
    ///
    /// Fails with `InsufficientStock` if the remaining stock would go
    /// negative; nothing is written in that case, and the caller is
    /// expected to abort its transaction so earlier deductions roll back
    /// with it.
    pub fn deduct_stock_txn(
        &self,
        txn: &WriteTransaction,
        product_id: ProductId,
        quantity: u32,
    ) -> AppResult<()> {
        let mut product = self
            .store
            .get_product_txn(txn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;

        let remaining = product.stock - i64::from(quantity);
        if remaining < 0 {
            return Err(AppError::InsufficientStock {
                product: product.name,
            });
        }
        product.stock = remaining;
        self.store.put_product(txn, &product)?;
        Ok(())
    }
}
