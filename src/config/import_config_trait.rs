// ==========================================
// 商品批量导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// ImportSettings - 单次导入使用的限制快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub max_rows: usize,
    pub max_name_length: usize,
    pub max_sku_length: usize,
    pub max_description_length: usize,
    pub max_image_urls: usize,
    pub max_upload_bytes: usize,
    pub template_cache_seconds: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_rows: 5_000,
            max_name_length: 200,
            max_sku_length: 32,
            max_description_length: 5_000,
            max_image_urls: 10,
            max_upload_bytes: 10 * 1024 * 1024,
            template_cache_seconds: 3_600,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、ImportSettings（固定配置）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 单个文件允许的最大数据行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 商品名称最大字符数
    ///
    /// # 默认值
    /// - 200
    async fn get_max_name_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// SKU 最大长度
    ///
    /// # 默认值
    /// - 32
    async fn get_max_sku_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 描述最大字符数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_description_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 每个商品最多图片链接数
    ///
    /// # 默认值
    /// - 10
    async fn get_max_image_urls(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 上传文件最大字节数
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_upload_bytes(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 模板下载缓存时长（秒）
    ///
    /// # 默认值
    /// - 3600
    async fn get_template_cache_seconds(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 一次性读取全部限制（每次导入开始时调用）
    async fn load_settings(&self) -> Result<ImportSettings, Box<dyn Error + Send + Sync>> {
        Ok(ImportSettings {
            max_rows: self.get_max_rows().await?,
            max_name_length: self.get_max_name_length().await?,
            max_sku_length: self.get_max_sku_length().await?,
            max_description_length: self.get_max_description_length().await?,
            max_image_urls: self.get_max_image_urls().await?,
            max_upload_bytes: self.get_max_upload_bytes().await?,
            template_cache_seconds: self.get_template_cache_seconds().await?,
        })
    }
}

#[async_trait]
impl ImportConfigReader for ImportSettings {
    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_rows)
    }

    async fn get_max_name_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_name_length)
    }

    async fn get_max_sku_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_sku_length)
    }

    async fn get_max_description_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_description_length)
    }

    async fn get_max_image_urls(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_image_urls)
    }

    async fn get_max_upload_bytes(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.max_upload_bytes)
    }

    async fn get_template_cache_seconds(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.template_cache_seconds)
    }

    async fn load_settings(&self) -> Result<ImportSettings, Box<dyn Error + Send + Sync>> {
        Ok(self.clone())
    }
}
