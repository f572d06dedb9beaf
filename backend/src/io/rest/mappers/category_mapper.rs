//! backend/src/io/rest/mappers/category_mapper.rs

use chrono::{DateTime, SecondsFormat, Utc};
use shared::{
    CacheStatsResponse, Category as SharedCategory, CategoryListResponse, CategoryResponse,
    CategoryTreeNode as SharedTreeNode, CategoryTreeResponse, CreateCategoryRequest,
    UpdateCategoryRequest,
};

use crate::cache::CacheStats;
use crate::domain::models::Category as DomainCategory;
use crate::domain::{CategoryPage, CategoryTreeNode, CreateCategoryCommand, UpdateCategoryCommand};

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Mapper between the shared category DTOs and domain types.
pub struct CategoryMapper;

impl CategoryMapper {
    pub fn to_dto(domain: DomainCategory) -> SharedCategory {
        SharedCategory {
            create_time: format_time(&domain.create_time),
            modify_time: format_time(&domain.modify_time),
            id: domain.id,
            parent_id: domain.parent_id,
            name: domain.name,
            category_type: domain.category_type.to_string(),
            remark: domain.remark,
        }
    }

    pub fn to_create_command(request: CreateCategoryRequest) -> CreateCategoryCommand {
        CreateCategoryCommand {
            parent_id: request.parent_id,
            name: request.name,
            category_type: request.category_type,
            remark: request.remark,
        }
    }

    pub fn to_update_command(request: UpdateCategoryRequest) -> UpdateCategoryCommand {
        UpdateCategoryCommand {
            parent_id: request.parent_id,
            name: request.name,
            category_type: request.category_type,
            remark: request.remark,
        }
    }

    pub fn to_category_response_dto(domain: DomainCategory, message: &str) -> CategoryResponse {
        CategoryResponse {
            category: Self::to_dto(domain),
            success_message: message.to_string(),
        }
    }

    pub fn to_list_dto(page: CategoryPage, limit: u32, offset: u32) -> CategoryListResponse {
        CategoryListResponse {
            categories: page.categories.into_iter().map(Self::to_dto).collect(),
            total_count: page.total_count,
            limit,
            offset,
        }
    }

    pub fn to_tree_node_dto(node: CategoryTreeNode) -> SharedTreeNode {
        SharedTreeNode {
            id: node.category.id,
            parent_id: node.category.parent_id,
            name: node.category.name,
            category_type: node.category.category_type.to_string(),
            children: node.children.into_iter().map(Self::to_tree_node_dto).collect(),
        }
    }

    pub fn to_tree_dto(
        forest: Vec<CategoryTreeNode>,
        deep: u32,
        category_type: Option<String>,
    ) -> CategoryTreeResponse {
        CategoryTreeResponse {
            data: forest.into_iter().map(Self::to_tree_node_dto).collect(),
            deep,
            category_type,
        }
    }

    pub fn to_cache_stats_dto(stats: CacheStats) -> CacheStatsResponse {
        CacheStatsResponse {
            enabled: stats.enabled,
            size: stats.size,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate,
            last_clear: format_time(&stats.last_clear),
        }
    }
}
