/// 管道请求（Request）
///
/// 经由中介者分发、由唯一处理器处理的消息；存储副作用通过行为与处理器挂接，
/// 处理器本身不包含存储逻辑。
///
/// 关联常量：
/// - `NAME`：请求的稳定名称，用于日志、追踪与路由。避免依赖 `type_name::<T>()`。
pub trait Request: Send + Sync + 'static {
    /// 请求的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 处理器返回的响应类型
    type Response: Send + Sync + 'static;
}
